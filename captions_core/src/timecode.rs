//! # 时间码值与文本格式
//!
//! 转换管线内部统一使用整数毫秒表示时间。
//! 本模块提供五种文本表示之间的解析与格式化，
//! 其中两种基于帧的广播形式仅由 STL 编码器在输出端使用。

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::ConvertError;

/// 可格式化的最大时间码毫秒值，即 `99:59:59,999`。
///
/// 同时作为字幕缺失 `end`/`dur` 属性时的远未来哨兵值。
pub const MAX_TIMECODE_MS: u64 = 359_999_999;

/// 时间码的文本表示形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TimecodeFormat {
    /// `hh:mm:ss,mmm`，毫秒精度。
    SrtMillis,
    /// `h:mm:ss.cc`，厘秒精度。
    AssCentis,
    /// `hh:mm:ss:ff`，帧精度。
    SmpteFrames {
        /// 每秒帧数。
        frame_rate: u32,
    },
    /// `hh:mm:ss:ff`，帧精度的广播形式。
    BroadcastFrames {
        /// 每秒帧数。
        frame_rate: u32,
    },
    /// `HHMMSSFF`，无分隔符，GSI 头的 `TCP`/`TCF` 字段使用。
    GsiBlock {
        /// 每秒帧数。
        frame_rate: u32,
    },
}

/// 以整数毫秒表示的时间码值。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TimecodeValue {
    millis: u64,
}

impl TimecodeValue {
    /// 从毫秒数构造时间码。
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// 取出毫秒数。
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.millis
    }

    /// 解析给定格式的时间码文本。
    ///
    /// # Errors
    ///
    /// 文本与格式不符、分量越界（分/秒 ≥ 60、帧 ≥ 帧率）
    /// 或格式需要帧率而帧率为 0 时返回 `ConvertError::InvalidTime`。
    pub fn parse(format: TimecodeFormat, text: &str) -> Result<Self, ConvertError> {
        let millis = match format {
            TimecodeFormat::SrtMillis => parse_srt_millis(text)?,
            TimecodeFormat::AssCentis => parse_ass_centis(text)?,
            TimecodeFormat::SmpteFrames { frame_rate }
            | TimecodeFormat::BroadcastFrames { frame_rate } => parse_frame_form(text, frame_rate)?,
            TimecodeFormat::GsiBlock { frame_rate } => parse_gsi_block(text, frame_rate)?,
        };
        Ok(Self::from_millis(millis))
    }

    /// 按给定格式输出时间码文本。
    ///
    /// 每个字段零填充到固定宽度；帧数换算始终向下取整，不做四舍五入。
    #[must_use]
    pub fn format(self, format: TimecodeFormat) -> String {
        let (hours, minutes, seconds, millis) = self.split_clock();
        match format {
            TimecodeFormat::SrtMillis => {
                format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
            }
            TimecodeFormat::AssCentis => {
                format!("{hours}:{minutes:02}:{seconds:02}.{:02}", millis / 10)
            }
            TimecodeFormat::SmpteFrames { frame_rate }
            | TimecodeFormat::BroadcastFrames { frame_rate } => {
                format!(
                    "{hours:02}:{minutes:02}:{seconds:02}:{:02}",
                    millis_to_frames(millis, frame_rate)
                )
            }
            TimecodeFormat::GsiBlock { frame_rate } => {
                format!(
                    "{hours:02}{minutes:02}{seconds:02}{:02}",
                    millis_to_frames(millis, frame_rate)
                )
            }
        }
    }

    /// 拆分为 STL TTI 块 `TCI`/`TCO` 字段使用的 (时, 分, 秒, 帧) 四个单字节分量。
    ///
    /// # Errors
    ///
    /// STL 以有符号 8 位整数编码每个分量，
    /// 任何分量超过 127 时返回 `ConvertError::TimecodeOutOfRange`。
    pub fn to_stl_components(self, frame_rate: u32) -> Result<[u8; 4], ConvertError> {
        let (hours, minutes, seconds, millis) = self.split_clock();
        let frames = millis_to_frames(millis, frame_rate);
        Ok([
            stl_component("小时", hours)?,
            stl_component("分钟", minutes)?,
            stl_component("秒", seconds)?,
            stl_component("帧", frames)?,
        ])
    }

    /// 拆分为 (时, 分, 秒, 毫秒)。
    const fn split_clock(self) -> (u64, u64, u64, u64) {
        let total_seconds = self.millis / 1000;
        (
            total_seconds / 3600,
            total_seconds / 60 % 60,
            total_seconds % 60,
            self.millis % 1000,
        )
    }
}

/// 毫秒换算为帧号，向下取整。
const fn millis_to_frames(millis: u64, frame_rate: u32) -> u64 {
    millis * frame_rate as u64 / 1000
}

/// 帧号换算为毫秒，向下取整。
fn frames_to_millis(frames: u64, frame_rate: u32, original: &str) -> Result<u64, ConvertError> {
    if frame_rate == 0 {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 的格式需要非零帧率"
        )));
    }
    Ok(frames * 1000 / u64::from(frame_rate))
}

fn stl_component(component: &'static str, value: u64) -> Result<u8, ConvertError> {
    match u8::try_from(value) {
        Ok(byte) if byte <= 127 => Ok(byte),
        _ => Err(ConvertError::TimecodeOutOfRange { component, value }),
    }
}

/// 解析一个纯数字字段。
fn parse_digit_field(field_str: &str, field: &str, original: &str) -> Result<u64, ConvertError> {
    if field_str.is_empty() || !field_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 的{field}部分 '{field_str}' 无效"
        )));
    }
    field_str.parse::<u64>().map_err(|e| {
        ConvertError::InvalidTime(format!(
            "无法解析时间戳 '{original}' 的{field}部分 '{field_str}': {e}"
        ))
    })
}

/// 解析 `hh:mm:ss` 形式的钟面三段，校验分/秒越界。
fn parse_clock_triplet(clock: &str, original: &str) -> Result<(u64, u64, u64), ConvertError> {
    let mut parts = clock.split(':');
    let hours = parse_digit_field(parts.next().unwrap_or(""), "小时", original)?;
    let minutes = parse_digit_field(parts.next().unwrap_or(""), "分钟", original)?;
    let seconds = parse_digit_field(parts.next().unwrap_or(""), "秒", original)?;
    if parts.next().is_some() {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 包含过多部分"
        )));
    }
    if minutes >= 60 {
        return Err(ConvertError::InvalidTime(format!(
            "分钟值 '{minutes}' (应 < 60) 在时间戳 '{original}' 中无效"
        )));
    }
    if seconds >= 60 {
        return Err(ConvertError::InvalidTime(format!(
            "秒值 '{seconds}' (应 < 60) 在时间戳 '{original}' 中无效"
        )));
    }
    Ok((hours, minutes, seconds))
}

/// 解析 `hh:mm:ss,mmm`。
fn parse_srt_millis(text: &str) -> Result<u64, ConvertError> {
    let (clock, millis_str) = text.split_once(',').ok_or_else(|| {
        ConvertError::InvalidTime(format!("时间戳 '{text}' 缺少毫秒分隔符 ','"))
    })?;
    let (hours, minutes, seconds) = parse_clock_triplet(clock, text)?;
    if millis_str.len() > 3 {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{text}' 的毫秒部分 '{millis_str}' 超过 3 位"
        )));
    }
    let millis = parse_digit_field(millis_str, "毫秒", text)?;
    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}

/// 解析 `h:mm:ss.cc`。
fn parse_ass_centis(text: &str) -> Result<u64, ConvertError> {
    let (clock, centis_str) = text.split_once('.').ok_or_else(|| {
        ConvertError::InvalidTime(format!("时间戳 '{text}' 缺少厘秒分隔符 '.'"))
    })?;
    let (hours, minutes, seconds) = parse_clock_triplet(clock, text)?;
    if centis_str.len() > 2 {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{text}' 的厘秒部分 '{centis_str}' 超过 2 位"
        )));
    }
    let centis = parse_digit_field(centis_str, "厘秒", text)?;
    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + centis * 10)
}

/// 解析 `hh:mm:ss:ff`。
fn parse_frame_form(text: &str, frame_rate: u32) -> Result<u64, ConvertError> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 4 {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{text}' 不是 hh:mm:ss:ff 形式"
        )));
    }
    let (hours, minutes, seconds) =
        parse_clock_triplet(&format!("{}:{}:{}", parts[0], parts[1], parts[2]), text)?;
    let frames = parse_digit_field(parts[3], "帧", text)?;
    if frame_rate != 0 && frames >= u64::from(frame_rate) {
        return Err(ConvertError::InvalidTime(format!(
            "帧值 '{frames}' (应 < {frame_rate}) 在时间戳 '{text}' 中无效"
        )));
    }
    Ok(hours * 3_600_000
        + minutes * 60_000
        + seconds * 1000
        + frames_to_millis(frames, frame_rate, text)?)
}

/// 解析 `HHMMSSFF`。
fn parse_gsi_block(text: &str, frame_rate: u32) -> Result<u64, ConvertError> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{text}' 不是 8 位数字的 HHMMSSFF 形式"
        )));
    }
    let (hours, minutes, seconds) = parse_clock_triplet(
        &format!("{}:{}:{}", &text[0..2], &text[2..4], &text[4..6]),
        text,
    )?;
    let frames = parse_digit_field(&text[6..8], "帧", text)?;
    if frame_rate != 0 && frames >= u64::from(frame_rate) {
        return Err(ConvertError::InvalidTime(format!(
            "帧值 '{frames}' (应 < {frame_rate}) 在时间戳 '{text}' 中无效"
        )));
    }
    Ok(hours * 3_600_000
        + minutes * 60_000
        + seconds * 1000
        + frames_to_millis(frames, frame_rate, text)?)
}

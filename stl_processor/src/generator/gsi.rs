//! # STL 生成器 - GSI 头构建
//!
//! GSI（General Subtitle Information）是 STL 文件开头固定 1024 字节的头块。
//! 字段表按 EBU Tech 3264 的顺序与字节长度声明，每个字段的取值来源
//! 是一个带标签的变体：固定字面值、由转换结果计算、必须赋值、空白默认。
//! "尚未赋值"因此是一个可区分的状态，而不是查询空槽位。

use std::collections::HashMap;

use captions_core::{ConvertError, TimecodeFormat, TimecodeValue};
use chrono::NaiveDate;

use super::STL_FRAME_RATE;

/// GSI 头的固定总长度。
pub const GSI_BLOCK_LEN: usize = 1024;

/// 字段表声明的最大显示行数（`MNR` 字段的值）。
pub const MAX_ROWS: u8 = 11;

/// 字段值的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiFieldSource {
    /// 固定字面值。
    Fixed(&'static str),
    /// 由转换结果计算。
    Computed(ComputedGsi),
    /// 必须由调用方赋值，构建时缺失即失败。
    Required,
    /// 未赋值时填充空格。
    BlankDefault,
}

/// 可计算字段的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedGsi {
    /// 创建日期，`YYMMDD`。
    CreationDate,
    /// 修订日期，`YYMMDD`。
    RevisionDate,
    /// TTI 块总数，零填充十进制。
    TotalBlocks,
    /// 字幕条目总数，零填充十进制。
    TotalSubtitles,
    /// 第一条字幕的时间码，`HHMMSSFF`。
    FirstCueTimecode,
}

/// 一个 GSI 字段的描述：名称、字节长度与取值来源。
#[derive(Debug, Clone, Copy)]
pub struct GsiField {
    /// 字段名。
    pub name: &'static str,
    /// 声明的字节长度。
    pub len: usize,
    /// 取值来源。
    pub source: GsiFieldSource,
}

/// 按 EBU Tech 3264 顺序排列的完整字段表，总长恰为 1024 字节。
pub const GSI_FIELDS: &[GsiField] = &[
    GsiField { name: "CPN", len: 3, source: GsiFieldSource::Fixed("850") },
    GsiField { name: "DFC", len: 8, source: GsiFieldSource::Fixed("STL25.01") },
    GsiField { name: "DSC", len: 1, source: GsiFieldSource::Fixed("1") },
    GsiField { name: "CCT", len: 2, source: GsiFieldSource::Fixed("00") },
    GsiField { name: "LC", len: 2, source: GsiFieldSource::Required },
    GsiField { name: "OPT", len: 32, source: GsiFieldSource::Required },
    GsiField { name: "OET", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "TPT", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "TET", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "TN", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "TCD", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "SLR", len: 16, source: GsiFieldSource::BlankDefault },
    GsiField { name: "CD", len: 6, source: GsiFieldSource::Computed(ComputedGsi::CreationDate) },
    GsiField { name: "RD", len: 6, source: GsiFieldSource::Computed(ComputedGsi::RevisionDate) },
    GsiField { name: "RN", len: 2, source: GsiFieldSource::Fixed("00") },
    GsiField { name: "TNB", len: 5, source: GsiFieldSource::Computed(ComputedGsi::TotalBlocks) },
    GsiField { name: "TNS", len: 5, source: GsiFieldSource::Computed(ComputedGsi::TotalSubtitles) },
    GsiField { name: "TNG", len: 3, source: GsiFieldSource::Fixed("001") },
    GsiField { name: "MNC", len: 2, source: GsiFieldSource::Fixed("40") },
    GsiField { name: "MNR", len: 2, source: GsiFieldSource::Fixed("11") },
    GsiField { name: "TCS", len: 1, source: GsiFieldSource::Fixed("1") },
    GsiField { name: "TCP", len: 8, source: GsiFieldSource::Fixed("00000000") },
    GsiField { name: "TCF", len: 8, source: GsiFieldSource::Computed(ComputedGsi::FirstCueTimecode) },
    GsiField { name: "TND", len: 1, source: GsiFieldSource::Fixed("1") },
    GsiField { name: "DSN", len: 1, source: GsiFieldSource::Fixed("1") },
    GsiField { name: "CO", len: 3, source: GsiFieldSource::BlankDefault },
    GsiField { name: "PUB", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "EN", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "ECD", len: 32, source: GsiFieldSource::BlankDefault },
    GsiField { name: "Spare", len: 75, source: GsiFieldSource::BlankDefault },
    GsiField { name: "UDA", len: 576, source: GsiFieldSource::BlankDefault },
];

/// 由编码结果与时钟得到的可计算字段输入。
#[derive(Debug, Clone)]
pub struct GsiComputedValues {
    /// 创建日期（同时用于修订日期）。
    pub creation_date: NaiveDate,
    /// TTI 块总数（含延续块）。
    pub total_blocks: usize,
    /// 字幕条目总数。
    pub total_subtitles: usize,
    /// 第一条字幕的起始时间码，文档为空时为 `None`。
    pub first_cue: Option<TimecodeValue>,
}

/// GSI 头构建器。
///
/// `assign` 只对 `Required` 与 `BlankDefault` 字段生效，
/// 赋入的字节长度必须与字段声明完全一致。
#[derive(Debug, Default)]
pub struct GsiBuilder {
    values: HashMap<&'static str, Vec<u8>>,
}

impl GsiBuilder {
    /// 创建一个没有任何赋值的构建器。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 给一个字段赋值。字节内容原样写入，不做填充。
    pub fn assign(&mut self, name: &'static str, value: impl Into<Vec<u8>>) {
        self.values.insert(name, value.into());
    }

    /// 按字段表顺序拼出完整的 1024 字节 GSI 头。
    ///
    /// # Errors
    ///
    /// * `ConvertError::MissingGsiField` - `Required` 字段从未被赋值。
    /// * `ConvertError::GsiFieldLengthMismatch` - 赋入值的字节长度与声明不符。
    pub fn build(&self, computed: &GsiComputedValues) -> Result<Vec<u8>, ConvertError> {
        let mut header = Vec::with_capacity(GSI_BLOCK_LEN);
        for field in GSI_FIELDS {
            let bytes: Vec<u8> = match field.source {
                GsiFieldSource::Fixed(literal) => literal.as_bytes().to_vec(),
                GsiFieldSource::Computed(kind) => compute_field(kind, computed),
                GsiFieldSource::Required => self
                    .values
                    .get(field.name)
                    .ok_or(ConvertError::MissingGsiField(field.name))?
                    .clone(),
                GsiFieldSource::BlankDefault => self
                    .values
                    .get(field.name)
                    .cloned()
                    .unwrap_or_else(|| vec![b' '; field.len]),
            };
            if bytes.len() != field.len {
                return Err(ConvertError::GsiFieldLengthMismatch {
                    name: field.name,
                    expected: field.len,
                    actual: bytes.len(),
                });
            }
            header.extend_from_slice(&bytes);
        }
        debug_assert_eq!(header.len(), GSI_BLOCK_LEN);
        Ok(header)
    }
}

fn compute_field(kind: ComputedGsi, computed: &GsiComputedValues) -> Vec<u8> {
    match kind {
        ComputedGsi::CreationDate | ComputedGsi::RevisionDate => computed
            .creation_date
            .format("%y%m%d")
            .to_string()
            .into_bytes(),
        ComputedGsi::TotalBlocks => format!("{:05}", computed.total_blocks).into_bytes(),
        ComputedGsi::TotalSubtitles => format!("{:05}", computed.total_subtitles).into_bytes(),
        ComputedGsi::FirstCueTimecode => computed
            .first_cue
            .map_or_else(
                || "00000000".to_string(),
                |cue| {
                    cue.format(TimecodeFormat::GsiBlock {
                        frame_rate: STL_FRAME_RATE,
                    })
                },
            )
            .into_bytes(),
    }
}

/// 把文本截断/空格填充为定长字段值，丢弃不可打印的字节。
#[must_use]
pub fn pad_field(text: &str, len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text
        .bytes()
        .filter(|byte| (0x20..=0x7e).contains(byte))
        .take(len)
        .collect();
    bytes.resize(len, b' ');
    bytes
}

/// 把文档语言映射为 EBU 语言代码（GSI `LC` 字段）。
///
/// 只取 BCP 47 标签的主语言子标签；不认识的语言返回 `None`。
#[must_use]
pub fn language_code(language: &str) -> Option<&'static str> {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match primary.as_str() {
        "sq" => Some("01"),
        "br" => Some("02"),
        "ca" => Some("03"),
        "hr" => Some("04"),
        "cy" => Some("05"),
        "cs" => Some("06"),
        "da" => Some("07"),
        "de" => Some("08"),
        "en" => Some("09"),
        "es" => Some("0A"),
        "eo" => Some("0B"),
        "et" => Some("0C"),
        "eu" => Some("0D"),
        "fo" => Some("0E"),
        "fr" => Some("0F"),
        "fy" => Some("10"),
        "ga" => Some("11"),
        "gd" => Some("12"),
        "gl" => Some("13"),
        "is" => Some("14"),
        "it" => Some("15"),
        "la" => Some("17"),
        "lv" => Some("18"),
        "lt" => Some("1A"),
        "hu" => Some("1B"),
        "mt" => Some("1C"),
        "nl" => Some("1D"),
        "no" => Some("1E"),
        "oc" => Some("1F"),
        "pl" => Some("20"),
        "pt" => Some("21"),
        "ro" => Some("22"),
        "rm" => Some("23"),
        "sr" => Some("24"),
        "sk" => Some("25"),
        "sl" => Some("26"),
        "fi" => Some("27"),
        "sv" => Some("28"),
        "tr" => Some("29"),
        _ => None,
    }
}

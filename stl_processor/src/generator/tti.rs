//! # STL 生成器 - TTI 块编码与累积布局
//!
//! 每条字幕编码为一个或多个固定 128 字节的 TTI 块。
//! 文本超出单块容量时产生延续块（EBN 递增，最后一块恒为 0xFF）。
//! 时间上重叠的字幕被归入"累积组"，组内成员共享终点时间并
//! 自底行向上堆叠垂直行号。

use captions_core::{
    CaptionNode, ConvertError, StyleRecord, TextAlign, TimecodeValue, TimedTextDocument,
};

/// 单个 TTI 块的固定长度。
pub const TTI_BLOCK_LEN: usize = 128;
/// 文本字段（TF）的长度：111 字节有效载荷 + 1 字节终止符。
pub const TEXT_FIELD_LEN: usize = 112;
/// 单块可携带的文本有效载荷上限。
pub const TEXT_PAYLOAD_LEN: usize = 111;

/// 电传文本行分隔符。
const LINE_BREAK: u8 = 0x8A;
/// 文本字段的填充/终止字节。
const FILLER: u8 = 0x8F;
/// 斜体开启控制码。
const ITALIC_ON: u8 = 0x80;
/// 下划线开启控制码。
const UNDERLINE_ON: u8 = 0x82;
/// 默认前景色：白色。
const COLOR_WHITE: u8 = 0x07;

/// 电传文本的 8 个前景色控制码，按样式 RGB 的精确匹配选择。
const TELETEXT_COLORS: &[(&str, u8)] = &[
    ("000000", 0x00),
    ("ff0000", 0x01),
    ("00ff00", 0x02),
    ("ffff00", 0x03),
    ("0000ff", 0x04),
    ("ff00ff", 0x05),
    ("00ffff", 0x06),
    ("ffffff", 0x07),
];

/// 垂直布局的底行行号。
const BOTTOM_ROW: u8 = 20;
/// 相邻字幕行之间的行距（双高行）。
const ROW_PITCH: u8 = 2;

/// 字幕在累积组中的状态，对应 TTI 块的 CS 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CumulativeStatus {
    /// 不属于任何累积组。
    #[default]
    None,
    /// 组的第一条。
    First,
    /// 组的中间条目。
    Intermediate,
    /// 组的最后一条。
    Last,
}

impl CumulativeStatus {
    /// CS 字节值。
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::First => 0x01,
            Self::Intermediate => 0x02,
            Self::Last => 0x03,
        }
    }
}

/// 一条字幕的编码计划：文本块与整篇布局的产物。
#[derive(Debug, Clone)]
pub struct SubtitleBlockPlan {
    /// 字幕序号（按起始时间升序）。
    pub ordinal: usize,
    /// 展平文本的行数（至少按 1 行计）。
    pub line_count: usize,
    /// 编码后的文本块，每块不超过 111 字节，至少一块。
    pub chunks: Vec<Vec<u8>>,
    /// 累积组状态。
    pub cumulative: CumulativeStatus,
    /// 分配到的垂直行号（VP 字节）。
    pub vertical_position: u8,
    /// 显示起点，必要时已向前夹取避免与上一组重叠。
    pub begin: TimecodeValue,
    /// 显示终点，组内成员共享组的最终终点。
    pub end: TimecodeValue,
    /// 对齐方式（JC 字节）。
    pub justification: u8,
}

/// 对整个文档做一次升序扫描，产出每条字幕的编码计划。
///
/// 贪心划分累积组：只要下一条字幕在当前组结束前开始、
/// 且并入后总行数不超过 `max_rows`，就并入当前组并把组终点
/// 扩展到两者较晚者；否则在上一条成员处关闭当前组。
#[must_use]
pub fn plan_blocks(document: &TimedTextDocument, max_rows: u8) -> Vec<SubtitleBlockPlan> {
    let mut plans: Vec<SubtitleBlockPlan> = document
        .captions
        .values()
        .enumerate()
        .map(|(ordinal, caption)| {
            let encoded = encode_caption_text(caption);
            SubtitleBlockPlan {
                ordinal,
                line_count: caption.line_count().max(1),
                chunks: split_chunks(&encoded),
                cumulative: CumulativeStatus::None,
                vertical_position: BOTTOM_ROW,
                begin: caption.begin,
                end: caption.end,
                justification: caption
                    .style
                    .as_ref()
                    .map_or(TextAlign::Center, |style| style.text_align)
                    .justification_code(),
            }
        })
        .collect();

    if plans.is_empty() {
        return plans;
    }

    let groups = collect_groups(&plans, max_rows);
    apply_group_layout(&mut plans, &groups);
    plans
}

/// 把计划序列化为连续的 TTI 块流。
///
/// # Errors
///
/// 当某条字幕的时间码分量超出单字节可编码范围时返回
/// `ConvertError::TimecodeOutOfRange`。
pub fn serialize_blocks(
    plans: &[SubtitleBlockPlan],
    frame_rate: u32,
) -> Result<Vec<u8>, ConvertError> {
    let total_blocks: usize = plans.iter().map(|plan| plan.chunks.len()).sum();
    let mut stream = Vec::with_capacity(total_blocks * TTI_BLOCK_LEN);
    let mut subtitle_number: u16 = 0;

    for plan in plans {
        let tci = plan.begin.to_stl_components(frame_rate)?;
        let tco = plan.end.to_stl_components(frame_rate)?;
        let last_index = plan.chunks.len() - 1;

        for (index, chunk) in plan.chunks.iter().enumerate() {
            let mut block = [0u8; TTI_BLOCK_LEN];
            let [sn_low, sn_high] = subtitle_number.to_le_bytes();
            block[0] = 0; // SGN
            block[1] = sn_low;
            block[2] = sn_high;
            block[3] = if index == last_index {
                0xFF
            } else {
                u8::try_from(index).unwrap_or(0xFE)
            };
            block[4] = plan.cumulative.code();
            block[5..9].copy_from_slice(&tci);
            block[9..13].copy_from_slice(&tco);
            block[13] = plan.vertical_position;
            block[14] = plan.justification;
            block[15] = 0; // CF
            let text_field = &mut block[16..];
            text_field[..chunk.len()].copy_from_slice(chunk);
            for byte in &mut text_field[chunk.len()..] {
                *byte = FILLER;
            }
            stream.extend_from_slice(&block);
            subtitle_number = subtitle_number.wrapping_add(1);
        }
    }
    Ok(stream)
}

/// 把一条字幕的展平文本编码为电传文本字节流。
///
/// 逐行处理：有样式时行首先写入斜体/下划线开关码和一个前景色码，
/// 然后是过滤掉不可打印字节（0x20–0x7F 之外）的行文本；
/// 行与行之间用 0x8A 连接。
fn encode_caption_text(caption: &CaptionNode) -> Vec<u8> {
    let style = caption.style.as_ref();
    let mut encoded = Vec::new();
    for (index, line) in caption.text.split('\n').enumerate() {
        if index > 0 {
            encoded.push(LINE_BREAK);
        }
        if let Some(style) = style {
            if style.italic {
                encoded.push(ITALIC_ON);
            }
            if style.underline {
                encoded.push(UNDERLINE_ON);
            }
            encoded.push(foreground_color_code(style));
        }
        encoded.extend(line.bytes().filter(|byte| (0x20..=0x7f).contains(byte)));
    }
    encoded
}

/// 样式前景色到 8 色控制码的精确匹配，匹配不上时回落到白色。
fn foreground_color_code(style: &StyleRecord) -> u8 {
    style
        .rgb_hex()
        .and_then(|rgb| {
            TELETEXT_COLORS
                .iter()
                .find(|(hex, _)| *hex == rgb)
                .map(|(_, code)| *code)
        })
        .unwrap_or(COLOR_WHITE)
}

/// 把编码后的字节流切成至多 111 字节的块，至少产出一块。
fn split_chunks(encoded: &[u8]) -> Vec<Vec<u8>> {
    if encoded.is_empty() {
        return vec![Vec::new()];
    }
    encoded
        .chunks(TEXT_PAYLOAD_LEN)
        .map(<[u8]>::to_vec)
        .collect()
}

/// 单次升序扫描划分累积组，返回 `[start, end)` 下标区间。
fn collect_groups(plans: &[SubtitleBlockPlan], max_rows: u8) -> Vec<(usize, usize)> {
    let max_rows = usize::from(max_rows);
    let mut groups = Vec::new();
    let mut group_start = 0;
    let mut group_end_ms = plans[0].end.as_millis();
    let mut group_lines = plans[0].line_count;

    for (index, plan) in plans.iter().enumerate().skip(1) {
        let overlaps = plan.begin.as_millis() < group_end_ms;
        if overlaps && group_lines + plan.line_count <= max_rows {
            group_end_ms = group_end_ms.max(plan.end.as_millis());
            group_lines += plan.line_count;
        } else {
            groups.push((group_start, index));
            group_start = index;
            group_end_ms = plan.end.as_millis();
            group_lines = plan.line_count;
        }
    }
    groups.push((group_start, plans.len()));
    groups
}

/// 落实每个组的共享终点、起点夹取、累积标记与垂直行号。
fn apply_group_layout(plans: &mut [SubtitleBlockPlan], groups: &[(usize, usize)]) {
    let mut previous_group_end = 0u64;

    for &(start, end) in groups {
        let members = &mut plans[start..end];
        let group_end = members
            .iter()
            .map(|member| member.end.as_millis())
            .max()
            .unwrap_or(previous_group_end);

        for member in members.iter_mut() {
            // 组内成员共享组的最终终点；起点向前夹取到上一组终点之后
            member.end = TimecodeValue::from_millis(group_end);
            let begin = member
                .begin
                .as_millis()
                .max(previous_group_end)
                .min(group_end);
            member.begin = TimecodeValue::from_millis(begin);
        }

        if members.len() > 1 {
            let last = members.len() - 1;
            for (index, member) in members.iter_mut().enumerate() {
                member.cumulative = if index == 0 {
                    CumulativeStatus::First
                } else if index == last {
                    CumulativeStatus::Last
                } else {
                    CumulativeStatus::Intermediate
                };
            }
        }

        // 自底行向上堆叠：组的最后一条占据底行，前面的成员依次叠在上方
        let mut cursor = i32::from(BOTTOM_ROW);
        for member in members.iter_mut().rev() {
            let span = i32::try_from((member.line_count - 1) * usize::from(ROW_PITCH))
                .unwrap_or(i32::MAX);
            let top = cursor.saturating_sub(span);
            member.vertical_position = u8::try_from(top.max(0)).unwrap_or(0);
            cursor = top - i32::from(ROW_PITCH);
        }

        previous_group_end = group_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(begin_ms: u64, end_ms: u64, text: &str) -> CaptionNode {
        CaptionNode {
            begin: TimecodeValue::from_millis(begin_ms),
            end: TimecodeValue::from_millis(end_ms),
            text: text.to_string(),
            ..CaptionNode::default()
        }
    }

    fn document_with(captions: Vec<CaptionNode>) -> TimedTextDocument {
        let mut document = TimedTextDocument::default();
        for caption in captions {
            document.insert_caption(caption);
        }
        document.mark_built();
        document
    }

    #[test]
    fn test_short_caption_yields_single_terminated_block() {
        let document = document_with(vec![caption(0, 2000, "Hello")]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].chunks.len(), 1);

        let stream = serialize_blocks(&plans, 25).unwrap();
        assert_eq!(stream.len(), TTI_BLOCK_LEN);
        assert_eq!(stream[3], 0xFF); // EBN：唯一块即最后一块
        assert_eq!(stream[4], 0x00); // CS：孤立字幕
        assert_eq!(&stream[16..21], b"Hello");
        assert!(stream[21..].iter().all(|&byte| byte == 0x8F));
    }

    #[test]
    fn test_long_caption_splits_into_extension_blocks() {
        // 150 字节文本：(111, 222] 区间，恰好两块
        let text = "x".repeat(150);
        let document = document_with(vec![caption(0, 2000, &text)]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans[0].chunks.len(), 2);
        assert_eq!(plans[0].chunks[0].len(), TEXT_PAYLOAD_LEN);
        assert_eq!(plans[0].chunks[1].len(), 39);

        let stream = serialize_blocks(&plans, 25).unwrap();
        assert_eq!(stream.len(), 2 * TTI_BLOCK_LEN);
        // 第一块 EBN=0x00，延续块 EBN=0xFF
        assert_eq!(stream[3], 0x00);
        assert_eq!(stream[TTI_BLOCK_LEN + 3], 0xFF);
        // SN 逐物理块递增
        assert_eq!(stream[1], 0);
        assert_eq!(stream[TTI_BLOCK_LEN + 1], 1);
    }

    #[test]
    fn test_styled_lines_carry_control_codes() {
        let mut styled = caption(0, 2000, "Red\nline");
        styled.style = Some(StyleRecord {
            id: "s1".to_string(),
            color: Some("ff0000ff".to_string()),
            italic: true,
            underline: true,
            ..StyleRecord::default()
        });
        let document = document_with(vec![styled]);
        let plans = plan_blocks(&document, 11);
        let chunk = &plans[0].chunks[0];
        // 每行行首：斜体、下划线、红色控制码
        assert_eq!(&chunk[0..3], &[0x80, 0x82, 0x01]);
        assert_eq!(&chunk[3..6], b"Red");
        assert_eq!(chunk[6], 0x8A);
        assert_eq!(&chunk[7..10], &[0x80, 0x82, 0x01]);
        assert_eq!(&chunk[10..14], b"line");
    }

    #[test]
    fn test_unmatched_color_falls_back_to_white() {
        let mut styled = caption(0, 2000, "x");
        styled.style = Some(StyleRecord {
            id: "s1".to_string(),
            color: Some("123456ff".to_string()),
            ..StyleRecord::default()
        });
        let document = document_with(vec![styled]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans[0].chunks[0][0], 0x07);
    }

    #[test]
    fn test_non_printable_bytes_are_dropped() {
        let document = document_with(vec![caption(0, 2000, "a\u{00e9}b\tc")]);
        let plans = plan_blocks(&document, 11);
        // é 的 UTF-8 字节与制表符都在 0x20–0x7F 之外
        assert_eq!(plans[0].chunks[0], b"abc".to_vec());
    }

    #[test]
    fn test_overlapping_captions_form_cumulative_group() {
        // A 0–4000ms 两行，B 3000–6000ms 一行，MNR=11
        let document = document_with(vec![
            caption(0, 4000, "line one\nline two"),
            caption(3000, 6000, "line three"),
        ]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans.len(), 2);

        assert_eq!(plans[0].cumulative, CumulativeStatus::First);
        assert_eq!(plans[1].cumulative, CumulativeStatus::Last);
        // 组内成员共享组终点
        assert_eq!(plans[0].end.as_millis(), 6000);
        assert_eq!(plans[1].end.as_millis(), 6000);
        assert_eq!(plans[0].begin.as_millis(), 0);
        assert_eq!(plans[1].begin.as_millis(), 3000);
        // 底行向上堆叠：B 占底行 20，A 的两行紧邻其上（16、18）
        assert_eq!(plans[1].vertical_position, 20);
        assert_eq!(plans[0].vertical_position, 16);
    }

    #[test]
    fn test_row_overflow_closes_group() {
        // 三条重叠字幕各 2 行，max_rows=4：第三条放不下，另起一组
        let document = document_with(vec![
            caption(0, 5000, "a\nb"),
            caption(1000, 5000, "c\nd"),
            caption(2000, 5000, "e\nf"),
        ]);
        let plans = plan_blocks(&document, 4);
        assert_eq!(plans[0].cumulative, CumulativeStatus::First);
        assert_eq!(plans[1].cumulative, CumulativeStatus::Last);
        assert_eq!(plans[2].cumulative, CumulativeStatus::None);
        // 新组的起点被夹取到上一组终点之后
        assert_eq!(plans[2].begin.as_millis(), 5000);
        assert_eq!(plans[2].end.as_millis(), 5000);
    }

    #[test]
    fn test_disjoint_captions_stay_singletons() {
        let document = document_with(vec![
            caption(0, 1000, "a"),
            caption(2000, 3000, "b"),
        ]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans[0].cumulative, CumulativeStatus::None);
        assert_eq!(plans[1].cumulative, CumulativeStatus::None);
        assert_eq!(plans[0].vertical_position, 20);
        assert_eq!(plans[1].vertical_position, 20);
    }

    #[test]
    fn test_group_line_total_never_exceeds_max_rows() {
        let document = document_with(vec![
            caption(0, 10000, "1\n2\n3\n4"),
            caption(1000, 10000, "5\n6\n7\n8"),
            caption(2000, 10000, "9\n10\n11\n12"),
        ]);
        let plans = plan_blocks(&document, 11);
        let groups = collect_groups(&plans, 11);
        for &(start, end) in &groups {
            let lines: usize = plans[start..end].iter().map(|plan| plan.line_count).sum();
            assert!(lines <= 11);
        }
    }

    #[test]
    fn test_deep_stack_floors_at_row_zero() {
        // 11 行 @ 行距 2 从底行 20 起：20, 18, ..., 0，恰好触底
        let text = vec!["x"; 11].join("\n");
        let document = document_with(vec![caption(0, 2000, &text)]);
        let plans = plan_blocks(&document, 11);
        assert_eq!(plans[0].vertical_position, 0);

        // 12 行则越过 0，被钳制
        let text = vec!["x"; 12].join("\n");
        let document = document_with(vec![caption(0, 2000, &text)]);
        let plans = plan_blocks(&document, 12);
        assert_eq!(plans[0].vertical_position, 0);
    }

    #[test]
    fn test_timecode_bytes_in_serialized_block() {
        let document = document_with(vec![caption(3_723_480, 3_725_000, "x")]);
        let plans = plan_blocks(&document, 11);
        let stream = serialize_blocks(&plans, 25).unwrap();
        // TCI：01:02:03 + 12 帧
        assert_eq!(&stream[5..9], &[1, 2, 3, 12]);
        // TCO：01:02:05 + 0 帧
        assert_eq!(&stream[9..13], &[1, 2, 5, 0]);
    }

    #[test]
    fn test_out_of_range_timecode_is_fatal() {
        let document = document_with(vec![caption(200 * 3_600_000, 201 * 3_600_000, "x")]);
        let plans = plan_blocks(&document, 11);
        assert!(matches!(
            serialize_blocks(&plans, 25),
            Err(ConvertError::TimecodeOutOfRange { .. })
        ));
    }
}

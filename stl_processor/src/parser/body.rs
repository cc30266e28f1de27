//! # TTML 解析器 - Body 处理模块
//!
//! 该模块包含了所有用于解析 TTML 文件中 `<p>` 块内部内容的函数，
//! 包括嵌套 `<span>`、显式 `<br/>` 与文本/实体内容，
//! 以及 `</p>` 时的展平、窗口裁剪与插入。

use std::str;

use captions_core::{CaptionNode, ContentNode, ConvertError, TimecodeValue, TimedTextDocument};
use quick_xml::{
    Reader,
    events::{BytesStart, BytesText, Event},
};

use super::TtmlParseOptions;
use super::constants::{TAG_BR, TAG_P, TAG_SPAN};
use super::state::{GroupFrame, TtmlParserState};
use super::style::resolve_element_style;

/// 处理在 `<p>` 标签内部的事件。
pub(super) fn handle_p_event(
    event: &Event<'_>,
    state: &mut TtmlParserState,
    reader: &Reader<&[u8]>,
    document: &mut TimedTextDocument,
    options: &TtmlParseOptions,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    match event {
        Event::Start(e) => match e.local_name().as_ref() {
            TAG_SPAN => process_span_start(e, state, reader, document, warnings)?,
            TAG_BR => {
                if let Some(children) = state.body_state.active_children() {
                    children.push(ContentNode::LineBreak);
                }
            }
            _ => {}
        },
        Event::Text(e) => process_text_event(e, state)?,
        Event::GeneralRef(e) => {
            let entity_name = str::from_utf8(e.as_ref())
                .map_err(|err| ConvertError::Internal(format!("无法将实体名解码为UTF-8: {err}")))?;
            let decoded_char = decode_entity(entity_name, warnings);
            if decoded_char != '\0' {
                let mut buf = [0u8; 4];
                state.body_state.push_text(decoded_char.encode_utf8(&mut buf));
            }
        }
        Event::End(e) => match e.local_name().as_ref() {
            TAG_P => handle_p_end(state, document, options),
            TAG_SPAN => process_span_end(state),
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

/// 解码一个 XML 实体引用。无法识别时记录警告并返回 `'\0'`。
fn decode_entity(entity_name: &str, warnings: &mut Vec<String>) -> char {
    if let Some(num_str) = entity_name.strip_prefix('#') {
        let (radix, code_point_str) = num_str
            .strip_prefix('x')
            .map_or((10, num_str), |stripped| (16, stripped));

        u32::from_str_radix(code_point_str, radix).map_or_else(
            |_| {
                warnings.push(format!("无法解析无效的XML数字实体 '&{entity_name};'"));
                '\0'
            },
            |code_point| char::from_u32(code_point).unwrap_or('\0'),
        )
    } else {
        match entity_name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                warnings.push(format!("忽略了未知的XML实体 '&{entity_name};'"));
                '\0'
            }
        }
    }
}

/// 处理 `<span>` 标签的开始事件。
///
/// span 自己落实的样式记入字幕的逐段样式列表，并作为组的样式覆盖保留。
fn process_span_start(
    e: &BytesStart,
    state: &mut TtmlParserState,
    reader: &Reader<&[u8]>,
    document: &TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    state.inline_style_counter += 1;
    let id = format!("inline-{}-{}", state.style_suffix, state.inline_style_counter);
    let style = resolve_element_style(
        e,
        reader,
        id,
        &document.styles,
        state.style_suffix,
        warnings,
    )?;

    if let Some(style) = &style
        && let Some(caption) = state.body_state.current_caption.as_mut()
    {
        caption.styles.push(style.clone());
    }

    state.body_state.group_stack.push(GroupFrame {
        children: Vec::new(),
        style_override: style,
    });
    Ok(())
}

/// 处理 `</span>`：把组弹出并挂回父节点。
fn process_span_end(state: &mut TtmlParserState) {
    if let Some(frame) = state.body_state.group_stack.pop()
        && let Some(children) = state.body_state.active_children()
    {
        children.push(ContentNode::Group {
            children: frame.children,
            style_override: frame.style_override,
        });
    }
}

fn process_text_event(e: &BytesText, state: &mut TtmlParserState) -> Result<(), ConvertError> {
    let text = e.xml_content().map_err(ConvertError::new_parse)?;
    if !text.is_empty() {
        state.body_state.push_text(&text);
    }
    Ok(())
}

/// 处理 `</p>` 结束事件：展平文本、做窗口裁剪与偏移，然后插入文档。
pub(super) fn handle_p_end(
    state: &mut TtmlParserState,
    document: &mut TimedTextDocument,
    options: &TtmlParseOptions,
) {
    if let Some(builder) = state.body_state.current_caption.take() {
        let mut caption = CaptionNode {
            region: builder.region,
            begin: TimecodeValue::from_millis(builder.begin_ms),
            end: TimecodeValue::from_millis(builder.end_ms),
            style: builder.styles.last().cloned(),
            styles: builder.styles,
            text: String::new(),
            children: builder.children,
        };
        caption.text = caption.flatten_text();

        if let Some(clipped) = clip_and_offset(caption, options) {
            document.insert_caption(clipped);
        }
    }
    state.body_state.in_p = false;
    state.body_state.group_stack.clear();
}

/// 窗口裁剪与时间轴偏移。
///
/// 与窗口没有重叠的字幕被丢弃；保留下来的字幕先夹取到窗口内，
/// 再整体平移 `offset_ms - window_start_ms`。
fn clip_and_offset(mut caption: CaptionNode, options: &TtmlParseOptions) -> Option<CaptionNode> {
    let begin = caption.begin.as_millis();
    let end = caption.end.as_millis();
    if begin >= end || end <= options.window_start_ms || begin >= options.window_end_ms {
        return None;
    }
    let clipped_begin = begin.max(options.window_start_ms);
    let clipped_end = end.min(options.window_end_ms);
    caption.begin =
        TimecodeValue::from_millis(options.offset_ms + (clipped_begin - options.window_start_ms));
    caption.end =
        TimecodeValue::from_millis(options.offset_ms + (clipped_end - options.window_start_ms));
    Some(caption)
}

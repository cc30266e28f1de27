//! # TTML 解析器 - 事件处理器与分发器
//!
//! 该模块负责顶层的事件分发与全局状态管理：
//! 识别文档的根元素，维护 `<body>`/`<div>` 的可继承属性作用域，
//! 并在 `<p>` 开始时完成祖先链上的时间与样式继承。

use captions_core::{ConvertError, MAX_TIMECODE_MS, TimedTextDocument};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::warn;

use super::constants::{
    ATTR_BEGIN, ATTR_DUR, ATTR_END, ATTR_FRAME_RATE, ATTR_REGION, ATTR_STYLE, ATTR_TICK_RATE,
    ATTR_XML_LANG, TAG_BODY, TAG_DIV, TAG_HEAD, TAG_P, TAG_TT,
};
use super::state::{CaptionBuilder, InheritableScope, TtmlParserState};
use super::style::resolve_element_style;
use super::utils::{get_string_attribute, get_time_attribute};

/// 处理全局事件（在 `<head>` 或 `<p>` 之外的事件）。
pub(super) fn handle_global_event(
    event: &Event<'_>,
    state: &mut TtmlParserState,
    reader: &Reader<&[u8]>,
    document: &mut TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    match event {
        Event::Start(e) => match e.local_name().as_ref() {
            TAG_TT => process_tt_start(e, state, reader, document, warnings)?,
            TAG_HEAD => state.in_head = true,
            TAG_BODY => {
                state.body_state.in_body = true;
                let scope = read_scope(e, state, reader, warnings)?;
                state.scopes.push(scope);
            }
            TAG_DIV if state.body_state.in_body => {
                let scope = read_scope(e, state, reader, warnings)?;
                state.scopes.push(scope);
            }
            TAG_P if state.body_state.in_body => {
                process_p_start(e, state, reader, document, warnings)?;
            }
            _ => {}
        },
        Event::End(e) => match e.local_name().as_ref() {
            TAG_BODY => {
                state.body_state.in_body = false;
                state.scopes.pop();
            }
            TAG_DIV if state.body_state.in_body => {
                state.scopes.pop();
            }
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

/// 处理 `<tt>` 标签的开始事件，这是文档的根元素。
/// 提取文档语言与 `ttp:frameRate`/`ttp:tickRate` 声明。
fn process_tt_start(
    e: &BytesStart,
    state: &mut TtmlParserState,
    reader: &Reader<&[u8]>,
    document: &mut TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    if let Some(lang) = get_string_attribute(e, reader, &[ATTR_XML_LANG])?
        && !lang.is_empty()
    {
        document.language = Some(lang);
    }

    if let Some(rate_str) = get_string_attribute(e, reader, &[ATTR_FRAME_RATE])? {
        match rate_str.trim().parse::<u32>() {
            Ok(rate) if rate > 0 => state.frame_rate = Some(rate),
            _ => warnings.push(format!("无法解析 ttp:frameRate '{rate_str}'，已忽略。")),
        }
    }
    if let Some(rate_str) = get_string_attribute(e, reader, &[ATTR_TICK_RATE])? {
        match rate_str.trim().parse::<u64>() {
            Ok(rate) if rate > 0 => state.tick_rate = Some(rate),
            _ => warnings.push(format!("无法解析 ttp:tickRate '{rate_str}'，已忽略。")),
        }
    }

    // 根元素自身也可以携带可继承属性
    let scope = read_scope(e, state, reader, warnings)?;
    state.scopes.push(scope);
    Ok(())
}

/// 读取一个元素上的可继承属性，形成祖先作用域。
fn read_scope(
    e: &BytesStart,
    state: &TtmlParserState,
    reader: &Reader<&[u8]>,
    warnings: &mut Vec<String>,
) -> Result<InheritableScope, ConvertError> {
    Ok(InheritableScope {
        begin_ms: get_time_attribute(
            e,
            reader,
            &[ATTR_BEGIN],
            state.frame_rate,
            state.tick_rate,
            warnings,
        )?,
        end_ms: get_time_attribute(
            e,
            reader,
            &[ATTR_END],
            state.frame_rate,
            state.tick_rate,
            warnings,
        )?,
        dur_ms: get_time_attribute(
            e,
            reader,
            &[ATTR_DUR],
            state.frame_rate,
            state.tick_rate,
            warnings,
        )?,
        region: get_string_attribute(e, reader, &[ATTR_REGION])?,
        style_ref: get_string_attribute(e, reader, &[ATTR_STYLE])?,
    })
}

/// 处理 `<p>` 标签的开始事件。
///
/// `region`/`begin`/`end`/`dur`/`style` 各自独立地沿祖先链向上解析，
/// 落在第一个携带该属性的祖先上。`end` 与 `dur` 都缺失时，
/// 终点取远未来哨兵值。
fn process_p_start(
    e: &BytesStart,
    state: &mut TtmlParserState,
    reader: &Reader<&[u8]>,
    document: &TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    state.body_state.in_p = true;
    state.body_state.group_stack.clear();

    let own = read_scope(e, state, reader, warnings)?;

    let begin_ms = state
        .resolve_inherited(own.begin_ms.as_ref(), |scope| scope.begin_ms.as_ref())
        .copied()
        .unwrap_or(0);
    let end_attr = state
        .resolve_inherited(own.end_ms.as_ref(), |scope| scope.end_ms.as_ref())
        .copied();
    let dur_attr = state
        .resolve_inherited(own.dur_ms.as_ref(), |scope| scope.dur_ms.as_ref())
        .copied();
    let end_ms =
        end_attr.unwrap_or_else(|| dur_attr.map_or(MAX_TIMECODE_MS, |dur| begin_ms + dur));
    let region = state
        .resolve_inherited(own.region.as_ref(), |scope| scope.region.as_ref())
        .cloned();

    state.inline_style_counter += 1;
    let id = format!("inline-{}-{}", state.style_suffix, state.inline_style_counter);
    let style = match resolve_element_style(
        e,
        reader,
        id,
        &document.styles,
        state.style_suffix,
        warnings,
    )? {
        Some(style) => Some(style),
        // <p> 自己没有样式信息时，沿祖先链查找被继承的 style 引用
        None => state
            .resolve_inherited(None, |scope| scope.style_ref.as_ref())
            .and_then(|ref_id| {
                let qualified = format!("{ref_id}-{}", state.style_suffix);
                let resolved = document.styles.get(&qualified).cloned();
                if resolved.is_none() {
                    warn!("未知的样式引用 '{ref_id}'");
                    warnings.push(format!("未知的样式引用 '{ref_id}'，该引用已被忽略。"));
                }
                resolved
            }),
    };

    let mut styles = Vec::new();
    if let Some(style) = style {
        styles.push(style);
    }

    state.body_state.current_caption = Some(CaptionBuilder {
        begin_ms,
        end_ms,
        region,
        styles,
        children: Vec::new(),
    });
    state.text_buffer.clear();
    Ok(())
}

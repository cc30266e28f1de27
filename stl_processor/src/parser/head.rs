//! # TTML 解析器 - Head 处理模块
//!
//! 该模块负责 `<head>` 块内部的内容：
//! `ttm:title`/`ttm:desc`/`ttm:copyright` 等文档元数据的提取，
//! 以及 `<styling>` 块中样式表的构建。

use captions_core::{ConvertError, StyleRecord, TimedTextDocument};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::constants::{
    ATTR_ID, ATTR_XML_ID, TAG_COPYRIGHT, TAG_DESC, TAG_HEAD, TAG_METADATA, TAG_NAME, TAG_STYLE,
    TAG_STYLING, TAG_TITLE,
};
use super::state::{MetadataTarget, TtmlParserState};
use super::style::resolve_element_style;
use super::utils::get_string_attribute;

/// 处理 `<head>` 块内部的事件。
pub(super) fn handle_head_event(
    event: &Event<'_>,
    reader: &Reader<&[u8]>,
    state: &mut TtmlParserState,
    document: &mut TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    match event {
        Event::Start(e) => match e.local_name().as_ref() {
            TAG_METADATA => state.in_metadata = true,
            TAG_STYLING => state.in_styling = true,
            TAG_STYLE if state.in_styling => {
                process_style_element(e, reader, state, document, warnings)?;
            }
            TAG_TITLE if state.in_metadata => begin_metadata_text(state, MetadataTarget::Title),
            TAG_DESC if state.in_metadata => {
                begin_metadata_text(state, MetadataTarget::Description);
            }
            TAG_COPYRIGHT if state.in_metadata => {
                begin_metadata_text(state, MetadataTarget::Copyright);
            }
            // <ttm:agent> 里的第一个 <ttm:name> 作为文档作者
            TAG_NAME if state.in_metadata && document.author.is_none() => {
                begin_metadata_text(state, MetadataTarget::Author);
            }
            _ => {}
        },
        Event::Text(e) => {
            if state.metadata_target.is_some() {
                state
                    .text_buffer
                    .push_str(&e.xml_content().map_err(ConvertError::new_parse)?);
            }
        }
        Event::End(e) => match e.local_name().as_ref() {
            TAG_HEAD => {
                state.in_head = false;
                state.in_metadata = false;
                state.metadata_target = None;
            }
            TAG_METADATA => {
                state.in_metadata = false;
                state.metadata_target = None;
            }
            TAG_STYLING => state.in_styling = false,
            TAG_TITLE | TAG_DESC | TAG_COPYRIGHT | TAG_NAME => {
                commit_metadata_text(state, document);
            }
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

fn begin_metadata_text(state: &mut TtmlParserState, target: MetadataTarget) {
    state.metadata_target = Some(target);
    state.text_buffer.clear();
}

/// 把捕获的元数据文本写入文档对应的字段。
fn commit_metadata_text(state: &mut TtmlParserState, document: &mut TimedTextDocument) {
    let Some(target) = state.metadata_target.take() else {
        return;
    };
    let text = state.text_buffer.trim();
    if text.is_empty() {
        return;
    }
    let value = Some(text.to_string());
    match target {
        MetadataTarget::Title => document.title = value,
        MetadataTarget::Description => document.description = value,
        MetadataTarget::Copyright => document.copyright = value,
        MetadataTarget::Author => document.author = value,
    }
}

/// 处理 `<styling>` 块中的一个 `<style>` 元素。
fn process_style_element(
    e: &BytesStart,
    reader: &Reader<&[u8]>,
    state: &TtmlParserState,
    document: &mut TimedTextDocument,
    warnings: &mut Vec<String>,
) -> Result<(), ConvertError> {
    let Some(raw_id) = get_string_attribute(e, reader, &[ATTR_XML_ID, ATTR_ID])? else {
        warnings.push("发现缺少 id 的 <style> 元素，已忽略。".to_string());
        return Ok(());
    };
    let id = format!("{raw_id}-{}", state.style_suffix);
    let style = resolve_element_style(
        e,
        reader,
        id.clone(),
        &document.styles,
        state.style_suffix,
        warnings,
    )?
    .unwrap_or_else(|| StyleRecord::new(id));
    document.styles.insert(style.id.clone(), style);
    Ok(())
}

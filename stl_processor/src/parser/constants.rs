//! # TTML 解析器 - 常量定义
//!
//! 该模块包含了在解析 TTML 文件时用到的所有 XML 标签和属性的常量定义。

pub(super) const TAG_TT: &[u8] = b"tt";
pub(super) const TAG_HEAD: &[u8] = b"head";
pub(super) const TAG_METADATA: &[u8] = b"metadata";
pub(super) const TAG_STYLING: &[u8] = b"styling";
pub(super) const TAG_STYLE: &[u8] = b"style";
pub(super) const TAG_BODY: &[u8] = b"body";
pub(super) const TAG_DIV: &[u8] = b"div";
pub(super) const TAG_P: &[u8] = b"p";
pub(super) const TAG_SPAN: &[u8] = b"span";
pub(super) const TAG_BR: &[u8] = b"br";

pub(super) const TAG_TITLE: &[u8] = b"title";
pub(super) const TAG_DESC: &[u8] = b"desc";
pub(super) const TAG_COPYRIGHT: &[u8] = b"copyright";
pub(super) const TAG_NAME: &[u8] = b"name";

pub(super) const ATTR_XML_LANG: &[u8] = b"xml:lang";
pub(super) const ATTR_XML_ID: &[u8] = b"xml:id";
pub(super) const ATTR_ID: &[u8] = b"id";
pub(super) const ATTR_BEGIN: &[u8] = b"begin";
pub(super) const ATTR_END: &[u8] = b"end";
pub(super) const ATTR_DUR: &[u8] = b"dur";
pub(super) const ATTR_REGION: &[u8] = b"region";
pub(super) const ATTR_STYLE: &[u8] = b"style";
pub(super) const ATTR_FRAME_RATE: &[u8] = b"ttp:frameRate";
pub(super) const ATTR_TICK_RATE: &[u8] = b"ttp:tickRate";

pub(super) const ATTR_TTS_BACKGROUND_COLOR: &[u8] = b"tts:backgroundColor";
pub(super) const ATTR_TTS_COLOR: &[u8] = b"tts:color";
pub(super) const ATTR_TTS_FONT_FAMILY: &[u8] = b"tts:fontFamily";
pub(super) const ATTR_TTS_FONT_SIZE: &[u8] = b"tts:fontSize";
pub(super) const ATTR_TTS_FONT_STYLE: &[u8] = b"tts:fontStyle";
pub(super) const ATTR_TTS_FONT_WEIGHT: &[u8] = b"tts:fontWeight";
pub(super) const ATTR_TTS_OPACITY: &[u8] = b"tts:opacity";
pub(super) const ATTR_TTS_TEXT_ALIGN: &[u8] = b"tts:textAlign";
pub(super) const ATTR_TTS_TEXT_DECORATION: &[u8] = b"tts:textDecoration";

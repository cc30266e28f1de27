//! # TTML (Timed Text Markup Language) 字幕解析器
//!
//! 将 W3C TTML 字幕文件一次性流式解析为 [`TimedTextDocument`]，
//! 同时应用调用方给定的显示时间窗口裁剪与时间轴偏移。

mod body;
mod constants;
mod handlers;
mod head;
mod state;
mod style;
mod utils;

use captions_core::{ConvertError, MAX_TIMECODE_MS, TimedTextDocument};
use quick_xml::{Reader, events::Event};
use tracing::error;

use self::state::TtmlParserState;

/// 一次解析会话。
///
/// 为每次 `parse_ttml` 调用分配一个递增的序号，用作样式 id 的后缀，
/// 以便区分来自多个文件的同名样式。由调用方显式持有并传入，
/// 不依赖任何进程级的全局状态。
#[derive(Debug, Default)]
pub struct ParseSession {
    parsed_files: u32,
}

impl ParseSession {
    /// 创建一个新的解析会话。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配下一个解析序号。
    fn next_suffix(&mut self) -> u32 {
        self.parsed_files += 1;
        self.parsed_files
    }
}

/// TTML 解析选项。
#[derive(Debug, Clone)]
pub struct TtmlParseOptions {
    /// 显示时间窗口的起点（毫秒）。
    pub window_start_ms: u64,
    /// 显示时间窗口的终点（毫秒）。
    pub window_end_ms: u64,
    /// 输出时间轴上窗口起点映射到的偏移（毫秒）。
    pub offset_ms: u64,
    /// 记录到文档上的源文件名。
    pub filename: Option<String>,
}

impl Default for TtmlParseOptions {
    fn default() -> Self {
        Self {
            window_start_ms: 0,
            window_end_ms: MAX_TIMECODE_MS,
            offset_ms: 0,
            filename: None,
        }
    }
}

/// 解析 TTML 格式的字幕文件。
///
/// # 参数
///
/// * `content` - TTML 格式的字幕文件内容字符串。
/// * `options` - 解析选项，包含显示时间窗口与时间轴偏移。
/// * `session` - 解析会话，为样式 id 提供跨文件的区分后缀。
///
/// # 返回
///
/// * `Ok(TimedTextDocument)` - 成功解析后，返回包含元数据、样式表与
///   按起始时间排序的字幕的文档，其构建标记已置位。
/// * `Err(ConvertError)` - 解析失败时，返回具体的错误信息。
///
/// # Errors
///
/// 此函数在以下情况下会返回错误：
///
/// * `ConvertError::Xml` - 当输入不是结构良好的 XML 时
/// * `ConvertError::Attribute` - 当 XML 属性本身无法解析时
/// * `ConvertError::Internal` - 当内部处理过程中出现意外错误时
///
/// 可恢复的异常（无法识别的颜色、样式引用或时间度量）不会中断解析，
/// 它们被记录到文档的 `warnings` 中并以安全默认值继续。
pub fn parse_ttml(
    content: &str,
    options: &TtmlParseOptions,
    session: &mut ParseSession,
) -> Result<TimedTextDocument, ConvertError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut document = TimedTextDocument::default();
    document.filename = options.filename.clone();
    let mut warnings: Vec<String> = Vec::new();
    let mut state = TtmlParserState::new(session.next_suffix());
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    "TTML 解析错误，位置 {}: {}。无法继续解析",
                    reader.error_position(),
                    e
                );
                return Err(ConvertError::Xml(e));
            }
        };

        if event == Event::Eof {
            break;
        }

        if state.body_state.in_p {
            body::handle_p_event(
                &event,
                &mut state,
                &reader,
                &mut document,
                options,
                &mut warnings,
            )?;
        } else if state.in_head {
            head::handle_head_event(&event, &reader, &mut state, &mut document, &mut warnings)?;
        } else {
            handlers::handle_global_event(&event, &mut state, &reader, &mut document, &mut warnings)?;
        }

        buf.clear();
    }

    document.warnings = warnings;
    document.mark_built();
    Ok(document)
}

//! # 解析器的状态机和数据结构

use captions_core::{ContentNode, StyleRecord};

/// 主解析器状态机，聚合了所有子状态和全局配置。
#[derive(Debug, Default)]
pub(super) struct TtmlParserState {
    /// 本次解析的会话序号，用于给样式 id 加后缀。
    pub(super) style_suffix: u32,
    /// `<tt ttp:frameRate>` 声明的帧率。
    pub(super) frame_rate: Option<u32>,
    /// `<tt ttp:tickRate>` 声明的时钟周期率。
    pub(super) tick_rate: Option<u64>,

    pub(super) in_head: bool,
    pub(super) in_metadata: bool,
    pub(super) in_styling: bool,
    /// 当前正在捕获文本的元数据目标。
    pub(super) metadata_target: Option<MetadataTarget>,
    /// 为 `<p>`/`<span>` 上的行内样式生成 id 的计数器。
    pub(super) inline_style_counter: u32,
    /// 通用文本缓冲区，用于临时存储标签内的文本内容。
    pub(super) text_buffer: String,

    /// 祖先链上携带的可继承属性，自外向内压栈（`<tt>` → `<body>` → `<div>`）。
    pub(super) scopes: Vec<InheritableScope>,
    /// 存储 `<body>` 和 `<p>` 区域解析状态的结构体。
    pub(super) body_state: BodyParseState,
}

impl TtmlParserState {
    pub(super) fn new(style_suffix: u32) -> Self {
        Self {
            style_suffix,
            ..Self::default()
        }
    }

    /// 沿祖先链自内向外查找第一个携带该属性的作用域。
    ///
    /// `own` 是当前元素自己的属性值，优先于所有祖先。
    pub(super) fn resolve_inherited<'a, T: Clone>(
        &'a self,
        own: Option<&'a T>,
        select: impl Fn(&'a InheritableScope) -> Option<&'a T>,
    ) -> Option<&'a T> {
        own.or_else(|| self.scopes.iter().rev().find_map(select))
    }
}

/// 可被 `<p>` 继承的祖先元素属性。
#[derive(Debug, Default, Clone)]
pub(super) struct InheritableScope {
    pub(super) begin_ms: Option<u64>,
    pub(super) end_ms: Option<u64>,
    pub(super) dur_ms: Option<u64>,
    pub(super) region: Option<String>,
    pub(super) style_ref: Option<String>,
}

/// 正在捕获文本的元数据元素。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MetadataTarget {
    Title,
    Description,
    Copyright,
    Author,
}

/// 存储 `<body>` 和 `<p>` 区域解析状态的结构体。
#[derive(Debug, Default)]
pub(super) struct BodyParseState {
    pub(super) in_body: bool,
    pub(super) in_p: bool,
    /// 存储当前正在处理的 `<p>` 元素的临时数据。
    pub(super) current_caption: Option<CaptionBuilder>,
    /// `<span>` 标签的上下文堆栈，用于处理嵌套的 span。
    pub(super) group_stack: Vec<GroupFrame>,
}

impl BodyParseState {
    /// 当前文本应落入的子节点列表：最内层的 `<span>`，否则 `<p>` 本身。
    pub(super) fn active_children(&mut self) -> Option<&mut Vec<ContentNode>> {
        if let Some(frame) = self.group_stack.last_mut() {
            return Some(&mut frame.children);
        }
        self.current_caption
            .as_mut()
            .map(|caption| &mut caption.children)
    }

    /// 把一段文本追加到当前位置，与前一个文本段合并。
    pub(super) fn push_text(&mut self, text: &str) {
        if let Some(children) = self.active_children() {
            if let Some(ContentNode::TextRun(run)) = children.last_mut() {
                run.push_str(text);
            } else {
                children.push(ContentNode::TextRun(text.to_string()));
            }
        }
    }
}

/// 存储当前处理的 `<p>` 元素解析过程中的临时数据。
#[derive(Debug, Default)]
pub(super) struct CaptionBuilder {
    pub(super) begin_ms: u64,
    pub(super) end_ms: u64,
    pub(super) region: Option<String>,
    /// 每个文本段落实的样式，最后一个即主样式。
    pub(super) styles: Vec<StyleRecord>,
    pub(super) children: Vec<ContentNode>,
}

/// 代表当前 `<span>` 的上下文信息。
#[derive(Debug, Default)]
pub(super) struct GroupFrame {
    pub(super) children: Vec<ContentNode>,
    pub(super) style_override: Option<StyleRecord>,
}

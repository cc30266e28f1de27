//! # 字幕文档数据模型
//!
//! 解析器一次性构建 [`TimedTextDocument`]，编码器只读消费它。
//! 字幕内容以带标签的节点树保存，镜像 TTML 源文件的结构：
//! 文本段、显式换行与嵌套的样式组。

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{StyleRecord, TimecodeValue};

/// 字幕内容节点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentNode {
    /// 一段连续的原始文本。
    TextRun(String),
    /// 显式换行（`<br/>`）。
    LineBreak,
    /// 嵌套的内容组（`<span>`），可携带自己的样式。
    Group {
        /// 组内的子节点。
        children: Vec<ContentNode>,
        /// 组自身落实的样式，没有样式信息时为 `None`。
        style_override: Option<StyleRecord>,
    },
}

/// 一条字幕。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptionNode {
    /// TTML `region` 属性，仅记录，不参与布局。
    pub region: Option<String>,
    /// 显示起点。
    pub begin: TimecodeValue,
    /// 显示终点。
    pub end: TimecodeValue,
    /// 主样式：该节点最后一次落实的样式。
    pub style: Option<StyleRecord>,
    /// 每个文本段落实的完整样式列表。
    pub styles: Vec<StyleRecord>,
    /// 展平后的文本内容，换行用 `\n` 表示。
    pub text: String,
    /// 镜像源结构的子节点树。
    pub children: Vec<ContentNode>,
}

impl CaptionNode {
    /// 将子节点树深度优先展平为文本。
    ///
    /// 原始文本里的换行折叠为空格，显式 `<br/>` 产生一个换行；
    /// 空白的修剪与折叠只在最外层节点做一次。
    #[must_use]
    pub fn flatten_text(&self) -> String {
        let mut raw = String::new();
        flatten_into(&self.children, &mut raw);
        normalize_flattened(&raw)
    }

    /// 展平文本的行数。
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            return 0;
        }
        self.text.split('\n').count()
    }
}

fn flatten_into(children: &[ContentNode], out: &mut String) {
    for child in children {
        match child {
            ContentNode::TextRun(text) => {
                for c in text.chars() {
                    out.push(if c == '\n' || c == '\r' { ' ' } else { c });
                }
            }
            ContentNode::LineBreak => out.push('\n'),
            ContentNode::Group { children, .. } => flatten_into(children, out),
        }
    }
}

/// 逐行折叠空白并去掉首尾的空行。
fn normalize_flattened(raw: &str) -> String {
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|line| {
            let mut collapsed = String::new();
            for word in line.split_whitespace() {
                if !collapsed.is_empty() {
                    collapsed.push(' ');
                }
                collapsed.push_str(word);
            }
            collapsed
        })
        .collect();
    while lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

/// 一次解析产出的完整字幕文档。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimedTextDocument {
    /// 节目标题（`ttm:title`）。
    pub title: Option<String>,
    /// 描述（`ttm:desc`）。
    pub description: Option<String>,
    /// 版权声明（`ttm:copyright`）。
    pub copyright: Option<String>,
    /// 作者。
    pub author: Option<String>,
    /// 源文件名，由调用方提供。
    pub filename: Option<String>,
    /// 文档语言（`xml:lang`）。
    pub language: Option<String>,
    /// 样式表，id → 样式记录。
    pub styles: HashMap<String, StyleRecord>,
    /// 字幕，以起始毫秒为键升序排列。
    pub captions: BTreeMap<u64, CaptionNode>,
    /// 解析过程中累积的非致命警告。
    pub warnings: Vec<String>,
    #[serde(skip)]
    built: bool,
}

impl TimedTextDocument {
    /// 插入一条字幕。
    ///
    /// 起始毫秒与已有键冲突时，后插入者的键反复 +1ms 直到唯一，
    /// 字幕自身的起点同步改写为最终键值。返回实际使用的键。
    pub fn insert_caption(&mut self, mut caption: CaptionNode) -> u64 {
        let mut key = caption.begin.as_millis();
        while self.captions.contains_key(&key) {
            key += 1;
        }
        caption.begin = TimecodeValue::from_millis(key);
        self.captions.insert(key, caption);
        key
    }

    /// 标记文档构建完成。编码器只接受已构建的文档。
    pub const fn mark_built(&mut self) {
        self.built = true;
    }

    /// 文档是否已构建完成。
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption_at(begin_ms: u64) -> CaptionNode {
        CaptionNode {
            begin: TimecodeValue::from_millis(begin_ms),
            end: TimecodeValue::from_millis(begin_ms + 1000),
            ..CaptionNode::default()
        }
    }

    #[test]
    fn test_flatten_text_runs_and_breaks() {
        let caption = CaptionNode {
            children: vec![
                ContentNode::TextRun("Hello \n world".to_string()),
                ContentNode::LineBreak,
                ContentNode::Group {
                    children: vec![ContentNode::TextRun("  nested   run ".to_string())],
                    style_override: None,
                },
            ],
            ..CaptionNode::default()
        };
        // 原始文本中的换行折叠为空格，<br/> 才产生换行
        assert_eq!(caption.flatten_text(), "Hello world\nnested run");
    }

    #[test]
    fn test_flatten_trims_outer_blank_lines() {
        let caption = CaptionNode {
            children: vec![
                ContentNode::LineBreak,
                ContentNode::TextRun("only line".to_string()),
                ContentNode::LineBreak,
            ],
            ..CaptionNode::default()
        };
        assert_eq!(caption.flatten_text(), "only line");
    }

    #[test]
    fn test_line_count() {
        let mut caption = CaptionNode::default();
        assert_eq!(caption.line_count(), 0);
        caption.text = "one".to_string();
        assert_eq!(caption.line_count(), 1);
        caption.text = "one\ntwo".to_string();
        assert_eq!(caption.line_count(), 2);
    }

    #[test]
    fn test_insert_caption_bumps_colliding_keys() {
        let mut document = TimedTextDocument::default();
        assert_eq!(document.insert_caption(caption_at(1000)), 1000);
        assert_eq!(document.insert_caption(caption_at(1000)), 1001);
        assert_eq!(document.insert_caption(caption_at(1000)), 1002);

        let keys: Vec<u64> = document.captions.keys().copied().collect();
        assert_eq!(keys, vec![1000, 1001, 1002]);
        // 被顶开的字幕起点同步改写
        assert_eq!(document.captions[&1002].begin.as_millis(), 1002);
    }

    #[test]
    fn test_built_gate() {
        let mut document = TimedTextDocument::default();
        assert!(!document.is_built());
        document.mark_built();
        assert!(document.is_built());
    }
}

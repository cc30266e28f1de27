//! TTML → STL 的端到端转换测试。

use chrono::NaiveDate;
use stl_processor::{
    ParseSession, StlGenerationOptions, TtmlParseOptions, generate_stl, parse_ttml,
};

const TTI_BLOCK_LEN: usize = 128;
const GSI_BLOCK_LEN: usize = 1024;

const PROGRAMME_TTML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<tt xmlns="http://www.w3.org/ns/ttml"
    xmlns:tts="http://www.w3.org/ns/ttml#styling"
    xmlns:ttm="http://www.w3.org/ns/ttml#metadata"
    xml:lang="en">
  <head>
    <metadata>
      <ttm:title>Night Train</ttm:title>
      <ttm:desc>Episode one</ttm:desc>
    </metadata>
    <styling>
      <style xml:id="yellow" tts:color="#FFFF00"/>
    </styling>
  </head>
  <body>
    <div>
      <p begin="00:00:00.000" end="00:00:04.000">line one<br/>line two</p>
      <p begin="00:00:03.000" end="00:00:06.000" style="yellow">line three</p>
      <p begin="00:00:10.000" end="00:00:12.000">solo</p>
    </div>
  </body>
</tt>"##;

fn fixed_options() -> StlGenerationOptions {
    StlGenerationOptions {
        creation_date: NaiveDate::from_ymd_opt(2016, 8, 17),
        language_code: None,
    }
}

fn convert(ttml: &str, parse_options: &TtmlParseOptions) -> Vec<u8> {
    let mut session = ParseSession::new();
    let document = parse_ttml(ttml, parse_options, &mut session).unwrap();
    generate_stl(&document, &fixed_options()).unwrap()
}

#[test]
fn test_full_conversion_layout() {
    let stream = convert(PROGRAMME_TTML, &TtmlParseOptions::default());

    // 三条单块字幕
    assert_eq!(stream.len(), GSI_BLOCK_LEN + 3 * TTI_BLOCK_LEN);
    assert_eq!(&stream[0..3], b"850");
    assert_eq!(&stream[3..11], b"STL25.01");
    assert_eq!(&stream[14..16], b"09");
    // OPT 来自 ttm:title
    assert_eq!(&stream[16..27], b"Night Train");
    // TNB / TNS
    assert_eq!(&stream[238..243], b"00003");
    assert_eq!(&stream[243..248], b"00003");
}

#[test]
fn test_cumulative_group_in_output() {
    let stream = convert(PROGRAMME_TTML, &TtmlParseOptions::default());
    let first = &stream[GSI_BLOCK_LEN..GSI_BLOCK_LEN + TTI_BLOCK_LEN];
    let second = &stream[GSI_BLOCK_LEN + TTI_BLOCK_LEN..GSI_BLOCK_LEN + 2 * TTI_BLOCK_LEN];
    let third = &stream[GSI_BLOCK_LEN + 2 * TTI_BLOCK_LEN..];

    // 前两条重叠，构成一个累积组；第三条是孤立字幕
    assert_eq!(first[4], 0x01);
    assert_eq!(second[4], 0x03);
    assert_eq!(third[4], 0x00);

    // 组内成员共享组终点 00:00:06:00
    assert_eq!(&first[9..13], &[0, 0, 6, 0]);
    assert_eq!(&second[9..13], &[0, 0, 6, 0]);

    // 两行的第一条叠在组尾字幕上方：底行 20，其上 16
    assert_eq!(second[13], 20);
    assert_eq!(first[13], 16);

    // SN 逐块递增，最后块 EBN 恒为 0xFF
    assert_eq!(first[1], 0);
    assert_eq!(second[1], 1);
    assert_eq!(third[1], 2);
    assert_eq!(first[3], 0xFF);
}

#[test]
fn test_styled_caption_text_field() {
    let stream = convert(PROGRAMME_TTML, &TtmlParseOptions::default());
    let second = &stream[GSI_BLOCK_LEN + TTI_BLOCK_LEN..GSI_BLOCK_LEN + 2 * TTI_BLOCK_LEN];
    // 黄色控制码 0x03 后接行文本
    assert_eq!(second[16], 0x03);
    assert_eq!(&second[17..27], b"line three");
    assert!(second[27..].iter().all(|&byte| byte == 0x8F));
}

#[test]
fn test_window_and_offset_shift_output_times() {
    let options = TtmlParseOptions {
        window_start_ms: 3000,
        window_end_ms: 12000,
        offset_ms: 3_600_000,
        ..TtmlParseOptions::default()
    };
    let stream = convert(PROGRAMME_TTML, &options);
    // 三条字幕都与窗口重叠，全部保留
    assert_eq!(stream.len(), GSI_BLOCK_LEN + 3 * TTI_BLOCK_LEN);

    let first = &stream[GSI_BLOCK_LEN..GSI_BLOCK_LEN + TTI_BLOCK_LEN];
    // [0,4000] 夹取到 [3000,4000]，映射到 1:00:00 起
    assert_eq!(&first[5..9], &[1, 0, 0, 0]);
    // TCF 与第一块的 TCI 一致
    assert_eq!(&stream[264..272], b"01000000");
}

#[test]
fn test_multi_block_caption_round_trip() {
    let long_line = "A".repeat(200);
    let ttml = format!(
        r#"<tt xmlns="http://www.w3.org/ns/ttml" xml:lang="en"><body><div>
            <p begin="1s" end="3s">{long_line}</p>
        </div></body></tt>"#
    );
    let stream = convert(&ttml, &TtmlParseOptions::default());

    // 200 字节文本落在 (111, 222] 区间：两个物理块
    assert_eq!(stream.len(), GSI_BLOCK_LEN + 2 * TTI_BLOCK_LEN);
    assert_eq!(&stream[238..243], b"00002");
    assert_eq!(&stream[243..248], b"00001");

    let first = &stream[GSI_BLOCK_LEN..GSI_BLOCK_LEN + TTI_BLOCK_LEN];
    let second = &stream[GSI_BLOCK_LEN + TTI_BLOCK_LEN..];
    assert_eq!(first[3], 0x00);
    assert_eq!(second[3], 0xFF);
    // 两块携带同一条字幕的时间码
    assert_eq!(&first[5..9], &second[5..9]);
}

#[test]
fn test_out_of_window_captions_do_not_reach_output() {
    let options = TtmlParseOptions {
        window_start_ms: 0,
        window_end_ms: 7000,
        ..TtmlParseOptions::default()
    };
    let stream = convert(PROGRAMME_TTML, &options);
    // 第三条 [10000,12000] 在窗口之外
    assert_eq!(stream.len(), GSI_BLOCK_LEN + 2 * TTI_BLOCK_LEN);
    assert_eq!(&stream[243..248], b"00002");
}

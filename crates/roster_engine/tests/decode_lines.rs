use pretty_assertions::assert_eq;
use roster_engine::LineDecoder;

const FEED: &str = concat!(
    "{\"type\":\"start\",\"total\":2}\n",
    "{\"type\":\"progress\",\"current\":1,\"total\":2,\"success_count\":1,\"failed_count\":0,",
    "\"last_result\":{\"email\":\"zoë@exämple.com\",\"success\":true,\"message\":\"已邀请 ✅\"}}\n",
    "\n",
    "{\"type\":\"error\",\"error\":\"上游超时\"}\r\n",
    "{\"type\":\"finish\",\"total\":2,\"success_count\":1,\"failed_count\":1}\n",
);

fn decode_all(chunks: &[&[u8]]) -> Vec<String> {
    let mut decoder = LineDecoder::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(decoder.push(chunk));
    }
    lines.extend(decoder.finish());
    lines
}

fn expected_lines() -> Vec<String> {
    FEED.split_terminator('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

#[test]
fn whole_feed_in_one_chunk() {
    assert_eq!(decode_all(&[FEED.as_bytes()]), expected_lines());
}

#[test]
fn every_two_way_split_yields_same_lines() {
    let bytes = FEED.as_bytes();
    let expected = expected_lines();
    for cut in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(cut);
        assert_eq!(decode_all(&[head, tail]), expected, "split at byte {cut}");
    }
}

#[test]
fn byte_at_a_time_yields_same_lines() {
    let chunks: Vec<&[u8]> = FEED.as_bytes().chunks(1).collect();
    assert_eq!(decode_all(&chunks), expected_lines());
}

#[test]
fn split_line_waits_for_terminator() {
    let mut decoder = LineDecoder::new();

    assert!(decoder.push(b"{\"type\":\"sta").is_empty());
    assert_eq!(decoder.pending_len(), 12);
    assert_eq!(
        decoder.push(b"rt\",\"total\":3}\n"),
        vec!["{\"type\":\"start\",\"total\":3}".to_string()]
    );
    assert_eq!(decoder.pending_len(), 0);
}

#[test]
fn split_multibyte_char_is_not_mangled() {
    let text = "é✅\n";
    let bytes = text.as_bytes();
    let mut decoder = LineDecoder::new();

    // "é" is two bytes, "✅" three; cut inside each.
    assert!(decoder.push(&bytes[..1]).is_empty());
    assert!(decoder.push(&bytes[1..3]).is_empty());
    assert_eq!(decoder.push(&bytes[3..]), vec!["é✅".to_string()]);
}

#[test]
fn trailing_line_without_newline_is_flushed_at_end() {
    let mut decoder = LineDecoder::new();

    assert!(decoder.push(b"{\"type\":\"finish\"").is_empty());
    assert_eq!(decoder.finish(), Some("{\"type\":\"finish\"".to_string()));
    assert!(decoder.push(b"more\n").is_empty());
    assert_eq!(decoder.finish(), None);
}

#[test]
fn whitespace_remainder_is_dropped_at_end() {
    let mut decoder = LineDecoder::new();

    assert_eq!(decoder.push(b"a\n  \t"), vec!["a".to_string()]);
    assert_eq!(decoder.finish(), None);
}

#[test]
fn invalid_bytes_become_replacement_chars() {
    let mut decoder = LineDecoder::new();

    let lines = decoder.push(b"ok \xff\xfe\n");
    assert_eq!(lines, vec!["ok \u{fffd}\u{fffd}".to_string()]);
}

#[test]
fn truncated_multibyte_at_end_of_stream_is_replaced() {
    let mut decoder = LineDecoder::new();

    assert!(decoder.push(&"x✅".as_bytes()[..2]).is_empty());
    assert_eq!(decoder.finish(), Some("x\u{fffd}".to_string()));
}

const MAX_PREVIEW_LENGTH: usize = 400;
const MAX_OUTPUT_LENGTH: usize = 4_000;

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// One-line preview of model output for debug logs.
pub fn preview(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.len() <= MAX_PREVIEW_LENGTH {
        flat
    } else {
        let cut = floor_char_boundary(&flat, MAX_PREVIEW_LENGTH);
        format!("{}...", &flat[..cut])
    }
}

/// Keeps the head and tail of long interpreter output, eliding the middle.
pub fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_LENGTH {
        return output.to_string();
    }
    let half = MAX_OUTPUT_LENGTH / 2;
    let head = &output[..floor_char_boundary(output, half)];
    let tail = &output[ceil_char_boundary(output, output.len() - half)..];
    format!(
        "{}\n\n... [truncated {} chars] ...\n\n{}",
        head,
        output.len() - head.len() - tail.len(),
        tail
    )
}

//! Compiler diagnostic formatting
//!
//! Drivers report errors as `ERROR: <column>:<line>: <message>`. The failing
//! source is echoed inside a slash frame with the reported line marked.

const LEFT_PADDING: usize = 7;
const RIGHT_PADDING: usize = 1;
const BANNER_ROWS: usize = 2;

/// Column and line of the first `ERROR: <col>:<line>` in a compiler log
pub fn error_location(log: &str) -> Option<(u32, u32)> {
    let rest = &log[log.find("ERROR:")? + "ERROR:".len()..];
    let rest = rest.trim_start();

    let (column, rest) = rest.split_once(':')?;
    let column = column.parse().ok()?;
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let line = rest[..digits].parse().ok()?;
    Some((column, line))
}

/// Echo `source` framed with slashes, marking the 1-based `error_line`
pub fn annotate_source(source: &str, error_line: Option<u32>) -> String {
    let longest = source.lines().map(str::len).max().unwrap_or(0);
    let banner = "/".repeat(LEFT_PADDING + longest + RIGHT_PADDING + 6);
    let gutter = "/".repeat(LEFT_PADDING);
    let marker = "X".repeat(LEFT_PADDING);

    let mut out = String::new();
    for _ in 0..BANNER_ROWS {
        out.push_str(&banner);
        out.push('\n');
    }
    out.push_str(&gutter);
    out.push('\n');

    for (index, line) in source.lines().enumerate() {
        let number = u32::try_from(index + 1).ok();
        if number.is_some() && number == error_line {
            out.push_str(&marker);
            out.push_str(">  ");
        } else {
            out.push_str(&gutter);
            out.push_str("   ");
        }
        out.push_str(line);
        out.push('\n');
    }

    out.push_str(&gutter);
    out.push('\n');
    for _ in 0..BANNER_ROWS {
        out.push_str(&banner);
        out.push('\n');
    }
    out
}

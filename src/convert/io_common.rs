use std::path::Path;

/// The path of an output file: the base path with a suffix appended, for
/// example `out/results` and `.tsv`.
pub fn output_path(output_base: &str, suffix: &str) -> String {
    format!("{}{}", output_base, suffix)
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Removes the lines that change from one run to the next, so that two
/// reports can be compared.
pub fn strip_volatile_lines(text: &str, volatile_prefix: &str) -> String {
    text.lines()
        .filter(|l| !l.starts_with(volatile_prefix))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(output_path("out/results", ".tsv"), "out/results.tsv");
        assert_eq!(simplify_file_name("/data/export.txt"), "export.txt");
    }

    #[test]
    fn strip() {
        let text = "A\r\nStamp: 1\nB\n";
        assert_eq!(strip_volatile_lines(text, "Stamp:"), "A\nB");
    }
}

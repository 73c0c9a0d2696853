/// Escapes XML special characters in a string.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Tom's "5k" <fast> & fun"#),
            "Tom&apos;s &quot;5k&quot; &lt;fast&gt; &amp; fun"
        );
    }
}

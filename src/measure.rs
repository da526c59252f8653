use unicode_width::UnicodeWidthStr;

/// Column alignment for the attribute rows of a rendered block.
pub struct ColumnMetrics {
    pub indent: usize,
    pub gutter: usize,
}

impl Default for ColumnMetrics {
    fn default() -> Self {
        Self {
            indent: 4,
            gutter: 1,
        }
    }
}

impl ColumnMetrics {
    pub fn text_width(&self, text: &str) -> usize {
        UnicodeWidthStr::width(text)
    }

    /// Display width of the widest name, i.e. where the second column starts.
    pub fn name_column_width<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> usize {
        names
            .into_iter()
            .map(|n| self.text_width(n))
            .max()
            .unwrap_or(0)
    }

    /// One indented row: `name` padded to `width`, then `rest` (if any).
    pub fn row(&self, name: &str, rest: &str, width: usize) -> String {
        let mut line = " ".repeat(self.indent);
        line.push_str(name);
        if !rest.is_empty() {
            let pad = width.saturating_sub(self.text_width(name)) + self.gutter;
            line.push_str(&" ".repeat(pad));
            line.push_str(rest);
        }
        line
    }
}

use tabled::{
    Table, Tabled,
    settings::{Panel, Remove, Style, object::Rows},
};

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub header: Option<String>,
    pub footer: Option<String>,
    /// Drop the column-name row.
    pub hide_columns: bool,
}

impl Formatter {
    pub fn build<T: Tabled, I: IntoIterator<Item = T>>(self, data: I) -> Table {
        let mut table = Table::new(data);
        if self.hide_columns {
            table.with(Remove::row(Rows::first()));
        }
        if let Some(header) = self.header {
            table.with(Panel::header(header));
        }
        if let Some(footer) = self.footer {
            table.with(Panel::footer(footer));
        }

        table.with(Style::blank());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        name: &'static str,
        size: u64,
    }

    #[test]
    fn test_table_has_footer() {
        let table = Formatter {
            footer: Some("1 asset".into()),
            ..Default::default()
        }
        .build([Row { name: "ep-1", size: 10 }]);
        let text = table.to_string();
        assert!(text.contains("ep-1"));
        assert!(text.contains("1 asset"));
        assert!(text.contains("name"));
    }
}

use tabled::{settings::Style, Table, Tabled};

use crate::model::FormSummary;
use crate::storage::StoreStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct FormRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Questions")]
    pub questions: usize,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&FormSummary> for FormRow {
    fn from(form: &FormSummary) -> Self {
        Self {
            id: form.id.clone(),
            title: form.title.clone(),
            questions: form.question_count,
            updated: form.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &StoreStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Backend", stats.backend.as_str());
    builder.add_row("Forms", &stats.forms.to_string());
    builder.add_row("Questions", &stats.questions.to_string());
    builder.add_row("Responses", &stats.responses.to_string());
    builder.build()
}

pub fn forms_table(forms: &[FormSummary]) -> String {
    let rows: Vec<FormRow> = forms.iter().map(FormRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

use anyhow::Result;
use indicatif::HumanBytes;
use tabled::Tabled;

use biograf_offline::AssetState;
use biograf_store::AssetRecord;

use super::Session;
use crate::ui::Formatter;

#[derive(Debug, clap::Args)]
#[clap(visible_alias = "list")]
pub struct Ls {}

#[derive(Tabled)]
struct AssetRow {
    name: String,
    tier: String,
    root: String,
    size: String,
    state: String,
}

impl AssetRow {
    fn new(record: &AssetRecord, state: AssetState) -> Self {
        Self {
            name: record.name.clone(),
            tier: record.tier.to_string(),
            root: record.root.clone(),
            size: HumanBytes(record.planned_bytes()).to_string(),
            state: state.to_string(),
        }
    }
}

impl Ls {
    pub fn run(self, session: &Session) -> Result<()> {
        let cache = &session.cache;
        let records = cache.assets()?;
        if records.is_empty() {
            println!("No cached assets.");
            return Ok(());
        }

        let rows = records
            .iter()
            .map(|record| Ok(AssetRow::new(record, cache.state(&record.root)?)))
            .collect::<Result<Vec<_>>>()?;
        let footer = format!(
            "{} asset(s), {}",
            rows.len(),
            HumanBytes(records.iter().map(AssetRecord::planned_bytes).sum())
        );
        let table = Formatter {
            footer: Some(footer),
            ..Default::default()
        }
        .build(rows);

        println!("{table}");
        Ok(())
    }
}

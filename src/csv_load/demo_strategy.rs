use crate::csv_load::core_loader::{
    CoreLoader, LoadReport, BRAND_COLUMNS, BRAND_CSV, BRAND_TABLE, SPEND_COLUMNS, SPEND_CSV,
    SPEND_TABLE,
};
use crate::csv_load::error::LoaderError;
use crate::csv_load::load_strategy::LoadStrategy;

/// Strategy for demo runs: clear both tables, reload the first `row_limit`
/// rows of each CSV, and only keep child rows whose brand was actually
/// loaded so the foreign key holds by construction.
pub struct DemoStrategy {
    row_limit: usize,
}

impl DemoStrategy {
    pub fn new(row_limit: usize) -> Self {
        Self { row_limit }
    }

    /// Chunks committed by the single spend insert: one when rows were
    /// staged, none when the filter left the stage empty.
    pub fn spend_chunks_for(staged_rows: i64) -> usize {
        usize::from(staged_rows > 0)
    }
}

impl LoadStrategy for DemoStrategy {
    fn load_into_postgres(&self, core: &CoreLoader) -> Result<LoadReport, LoaderError> {
        println!("LOADING DEMO DATA (first {} rows per table)", self.row_limit);

        core.ensure_schema()?;
        println!("Destination tables ready.");

        core.clear_existing_data()?;
        println!("Existing rows cleared.");

        let staged_brands = core.stage_brand_csv(BRAND_CSV, Some(self.row_limit))?;
        core.insert_staged_brands()?;
        println!("Loaded {} BrandDetail rows", staged_brands);

        let staged_spend = core.stage_spend_csv(SPEND_CSV, true, Some(self.row_limit))?;
        println!(
            "Filtered DailySpend stage: {} rows match a loaded brand",
            staged_spend
        );
        core.insert_staged_spend(None)?;
        println!("Loaded {} DailySpend rows", staged_spend);

        let brand_rows = core.count_destination_rows(BRAND_TABLE)?;
        let spend_rows = core.count_destination_rows(SPEND_TABLE)?;
        println!(
            "Final counts: BrandDetail={}, DailySpend={}",
            brand_rows, spend_rows
        );

        println!("Sample BrandDetail rows:");
        core.print_sample_rows(BRAND_TABLE, &BRAND_COLUMNS, 3)?;
        println!("Sample DailySpend rows:");
        core.print_sample_rows(SPEND_TABLE, &SPEND_COLUMNS, 3)?;

        Ok(LoadReport {
            brand_rows,
            spend_rows,
            spend_chunks: Self::spend_chunks_for(staged_spend),
        })
    }
}

use crate::csv_load::core_loader::{
    chunk_ranges, CoreLoader, LoadReport, BRAND_CSV, BRAND_TABLE, SPEND_CSV, SPEND_TABLE,
};
use crate::csv_load::error::LoaderError;
use crate::csv_load::load_strategy::LoadStrategy;

/// Strategy for full loads: append every row of both CSVs, with the child
/// inserts sliced into fixed-size chunks so each committed statement carries
/// a bounded payload. Earlier chunks stay applied if a later one fails.
pub struct ProductionStrategy {
    chunk_size: usize,
}

impl ProductionStrategy {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl LoadStrategy for ProductionStrategy {
    fn load_into_postgres(&self, core: &CoreLoader) -> Result<LoadReport, LoaderError> {
        println!(
            "LOADING FULL DATA (child inserts chunked at {} rows)",
            self.chunk_size
        );

        core.ensure_schema()?;
        println!("Destination tables ready.");

        let staged_brands = core.stage_brand_csv(BRAND_CSV, None)?;
        core.insert_staged_brands()?;
        println!("Loaded {} BrandDetail rows", staged_brands);

        let staged_spend = core.stage_spend_csv(SPEND_CSV, false, None)?;
        let ranges = chunk_ranges(staged_spend as usize, self.chunk_size);
        for (i, &(lo, hi)) in ranges.iter().enumerate() {
            core.insert_staged_spend(Some((lo, hi)))?;
            println!("Committed chunk {}/{} ({} rows)", i + 1, ranges.len(), hi - lo);
        }
        println!("Loaded {} DailySpend rows", staged_spend);

        let brand_rows = core.count_destination_rows(BRAND_TABLE)?;
        let spend_rows = core.count_destination_rows(SPEND_TABLE)?;
        println!(
            "Final counts: BrandDetail={}, DailySpend={}",
            brand_rows, spend_rows
        );

        Ok(LoadReport {
            brand_rows,
            spend_rows,
            spend_chunks: ranges.len(),
        })
    }
}

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use csv::Writer;

/// Alpha above which a texel counts as painted (one 8-bit step)
const COVERAGE_THRESHOLD: u8 = 1;

/// Summary of one pigment/water readback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub mean_pigment_alpha: f32,
    pub mean_water: f32,
    /// Fraction of texels carrying any pigment
    pub coverage: f32,
}

impl FieldStats {
    /// Compute from tightly packed RGBA8 pigment and water fields
    pub fn from_rgba(pigment: &[u8], water: &[u8]) -> Self {
        let texels = (pigment.len() / 4).max(1) as f32;

        let mut alpha_sum = 0u64;
        let mut covered = 0u64;
        for texel in pigment.chunks_exact(4) {
            alpha_sum += texel[3] as u64;
            if texel[3] >= COVERAGE_THRESHOLD {
                covered += 1;
            }
        }

        let water_texels = (water.len() / 4).max(1) as f32;
        let water_sum: u64 = water.chunks_exact(4).map(|texel| texel[0] as u64).sum();

        Self {
            mean_pigment_alpha: alpha_sum as f32 / 255.0 / texels,
            mean_water: water_sum as f32 / 255.0 / water_texels,
            coverage: covered as f32 / texels,
        }
    }
}

/// Metrics writer for CSV output
pub struct MetricsWriter {
    csv_writer: Writer<File>,
    rows: u32,
}

impl MetricsWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        let file = File::create(output_dir.join("metrics.csv"))?;
        let mut csv_writer = Writer::from_writer(file);

        csv_writer.write_record([
            "frame",
            "parity",
            "mean_pigment_alpha",
            "mean_water",
            "coverage",
            "wall_time_ms",
        ])?;

        Ok(Self { csv_writer, rows: 0 })
    }

    /// Write metrics for one snapshot frame
    pub fn write_frame(
        &mut self,
        frame: u32,
        parity: usize,
        stats: &FieldStats,
        frame_time: Duration,
    ) -> Result<(), anyhow::Error> {
        let wall_time_ms = frame_time.as_secs_f64() * 1000.0;

        self.csv_writer.write_record(&[
            frame.to_string(),
            parity.to_string(),
            stats.mean_pigment_alpha.to_string(),
            stats.mean_water.to_string(),
            stats.coverage.to_string(),
            format!("{:.3}", wall_time_ms),
        ])?;

        self.csv_writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }
}

use super::dimension::{
    DataRow, DimensionError, ExchangeType, ReplicaDimension, check_index, read_data_rows,
};
use crate::core::io::paths::expand_tilde;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

fn first_float(row: &DataRow) -> Option<f64> {
    row.content.split_whitespace().next()?.parse().ok()
}

fn range_description(prefix: &str, values: &[f64]) -> String {
    match (values.first(), values.last()) {
        (Some(lo), Some(hi)) => format!("{} from {} K to {} K", prefix, lo, hi),
        _ => String::new(),
    }
}

/// Temperature replica exchange: one target temperature per replica.
#[derive(Debug, Default, Clone)]
pub struct TemperatureDim {
    temperatures: Vec<f64>,
    description: String,
}

impl TemperatureDim {
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }
}

impl ReplicaDimension for TemperatureDim {
    fn key(&self) -> &'static str {
        "TEMPERATURE"
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Temperature
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size(&self) -> usize {
        self.temperatures.len()
    }

    fn load_dim(&mut self, path: &Path) -> Result<(), DimensionError> {
        let temperatures = read_data_rows(path)?
            .iter()
            .map(|row| first_float(row).ok_or_else(|| row.parse_error("temperature", path)))
            .collect::<Result<Vec<_>, _>>()?;
        self.description = range_description("Temperature exchange", &temperatures);
        self.temperatures = temperatures;
        Ok(())
    }

    fn write_mdin(&self, idx: usize, writer: &mut dyn Write) -> Result<(), DimensionError> {
        check_index(idx, self.size())?;
        let temp = self.temperatures[idx];
        writeln!(writer, "    temp0={:.6}, tempi={:.6},", temp, temp)?;
        Ok(())
    }
}

/// Hamiltonian exchange over a set of topology files, one per replica.
#[derive(Debug, Default, Clone)]
pub struct TopologyDim {
    topologies: Vec<PathBuf>,
    description: String,
}

impl TopologyDim {
    pub fn topologies(&self) -> &[PathBuf] {
        &self.topologies
    }
}

impl ReplicaDimension for TopologyDim {
    fn key(&self) -> &'static str {
        "TOPOLOGY"
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Hamiltonian
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size(&self) -> usize {
        self.topologies.len()
    }

    fn load_dim(&mut self, path: &Path) -> Result<(), DimensionError> {
        self.topologies = read_data_rows(path)?
            .iter()
            .map(|row| expand_tilde(Path::new(row.content.trim())))
            .collect();
        self.description = "Varying topology files".to_string();
        Ok(())
    }

    fn write_mdin(&self, idx: usize, _writer: &mut dyn Write) -> Result<(), DimensionError> {
        check_index(idx, self.size())
    }

    /// `ext` is the replica's groupfile extension and must be its zero-based
    /// index in decimal (`000`, `001`, ...). Any other extension, or an index
    /// past the last topology, contributes nothing.
    fn groupline(&self, ext: &str) -> String {
        ext.parse::<usize>()
            .ok()
            .and_then(|idx| self.topology(idx))
            .map(|top| format!(" -p {}", top.display()))
            .unwrap_or_default()
    }

    fn topology(&self, idx: usize) -> Option<&Path> {
        self.topologies.get(idx).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmdColumns {
    /// `<alpha> <threshold>`
    Two,
    /// `<topology> <alpha> <threshold>`, topology ignored
    Three,
}

impl AmdColumns {
    fn detect(row: &DataRow) -> Option<Self> {
        fn numeric(s: &str) -> bool {
            s.parse::<f64>().is_ok()
        }
        let tokens: Vec<&str> = row.content.split_whitespace().collect();
        match tokens.as_slice() {
            [_, a, t, ..] if numeric(a) && numeric(t) => Some(AmdColumns::Three),
            [a, t] if numeric(a) && numeric(t) => Some(AmdColumns::Two),
            _ => None,
        }
    }

    fn parse(&self, row: &DataRow) -> Option<(f64, f64)> {
        let skip = match self {
            AmdColumns::Two => 0,
            AmdColumns::Three => 1,
        };
        let mut tokens = row.content.split_whitespace().skip(skip);
        let alpha = tokens.next()?.parse().ok()?;
        let threshold = tokens.next()?.parse().ok()?;
        Some((alpha, threshold))
    }
}

/// Accelerated MD with a per-replica dihedral boost `(alpha, threshold)`.
///
/// Rows may carry a leading topology column, which is ignored. The layout is
/// decided by the first data row and must hold for the rest of the file.
#[derive(Debug, Default, Clone)]
pub struct AmdDihedralDim {
    alphas: Vec<f64>,
    thresholds: Vec<f64>,
    description: String,
}

impl AmdDihedralDim {
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

impl ReplicaDimension for AmdDihedralDim {
    fn key(&self) -> &'static str {
        "AMD_DIHEDRAL"
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Hamiltonian
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size(&self) -> usize {
        self.alphas.len()
    }

    fn load_dim(&mut self, path: &Path) -> Result<(), DimensionError> {
        let rows = read_data_rows(path)?;
        let columns = AmdColumns::detect(&rows[0])
            .ok_or_else(|| rows[0].parse_error("alpha/threshold", path))?;
        if columns == AmdColumns::Three {
            warn!("Topologies from {} will be ignored.", path.display());
        }

        let (alphas, thresholds): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .map(|row| {
                columns
                    .parse(row)
                    .ok_or_else(|| row.parse_error("alpha/threshold", path))
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .unzip();
        self.alphas = alphas;
        self.thresholds = thresholds;
        self.description = "AMD with various dihedral boost levels".to_string();
        Ok(())
    }

    fn write_mdin(&self, idx: usize, writer: &mut dyn Write) -> Result<(), DimensionError> {
        check_index(idx, self.size())?;
        let (alpha, threshold) = (self.alphas[idx], self.thresholds[idx]);
        if threshold > 0.0 || alpha > 0.0 {
            writeln!(
                writer,
                "    iamd=2, EthreshD={:.6}, alphaD={:.6},",
                threshold, alpha
            )?;
        }
        Ok(())
    }

    fn groupline(&self, ext: &str) -> String {
        format!(" -amd AMD/amd.{}", ext)
    }
}

/// Replica-exchange self-guided Langevin dynamics: one guiding temperature
/// per replica.
#[derive(Debug, Default, Clone)]
pub struct SgldDim {
    sg_temperatures: Vec<f64>,
    description: String,
}

impl SgldDim {
    pub fn sg_temperatures(&self) -> &[f64] {
        &self.sg_temperatures
    }
}

impl ReplicaDimension for SgldDim {
    fn key(&self) -> &'static str {
        "SGLD"
    }

    fn exchange_type(&self) -> ExchangeType {
        ExchangeType::Temperature
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size(&self) -> usize {
        self.sg_temperatures.len()
    }

    fn load_dim(&mut self, path: &Path) -> Result<(), DimensionError> {
        let sg_temperatures = read_data_rows(path)?
            .iter()
            .map(|row| first_float(row).ok_or_else(|| row.parse_error("SGLD temperature", path)))
            .collect::<Result<Vec<_>, _>>()?;
        self.description = range_description("RXSGLD", &sg_temperatures);
        self.sg_temperatures = sg_temperatures;
        Ok(())
    }

    fn write_mdin(&self, idx: usize, writer: &mut dyn Write) -> Result<(), DimensionError> {
        check_index(idx, self.size())?;
        writeln!(
            writer,
            "    isgld=1, tsgavg=0.2, tempsg={:.6}",
            self.sg_temperatures[idx]
        )?;
        Ok(())
    }
}

use crate::model::AbsenceStat;

/// Number of bars on the absence chart.
pub const CHART_LIMIT: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct AbsenceBoard {
    stats: Vec<AbsenceStat>,
}

impl AbsenceBoard {
    pub fn replace(&mut self, stats: Vec<AbsenceStat>) {
        self.stats = stats;
    }

    pub fn stats(&self) -> &[AbsenceStat] {
        &self.stats
    }

    pub fn top(&self, n: usize) -> Vec<AbsenceStat> {
        top_n(&self.stats, n)
    }
}

/// Highest counts first; ties keep source order. The source is not touched.
pub fn top_n(stats: &[AbsenceStat], n: usize) -> Vec<AbsenceStat> {
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(n);
    sorted
}

use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub costs: usize,
    pub makespan: usize,
    pub time_us: usize,
    pub expanded_nodes: usize,
    pub generated_nodes: usize,
    pub replans_attempted: usize,
    pub replans_succeeded: usize,
    pub merges: usize,
    pub largest_group: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Cost {:?} Makespan {:?} Time(microseconds) {:?} Expanded nodes: {:?} Generated nodes: {:?}",
            self.costs, self.makespan, self.time_us, self.expanded_nodes, self.generated_nodes
        );
        info!(
            "Replans {:?}/{:?} Merges {:?} Largest group {:?}",
            self.replans_succeeded, self.replans_attempted, self.merges, self.largest_group
        );
    }
}

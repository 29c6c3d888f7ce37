/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work whose output is delivered straight to the display, such as the
	/// changeset pipeline loop.
	Interactive,
	/// Async work that runs independently of the display, such as data refreshes.
	Background,
	/// CPU-heavy work (projection, filtering and diffing of large snapshots)
	/// executed on the blocking pool.
	CpuBlocking,
}

impl TaskClass {
	/// Stable label used in tracing fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::CpuBlocking => "cpu_blocking",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn labels_are_distinct() {
		let labels = [TaskClass::Interactive, TaskClass::Background, TaskClass::CpuBlocking].map(TaskClass::as_str);
		assert_eq!(labels, ["interactive", "background", "cpu_blocking"]);
	}
}

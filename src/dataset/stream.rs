//! Streaming producer/consumer contract between loaders and the table model.
//!
//! A [`DataSetProducer`] emits `start_dataset` / `start_table` / `row` /
//! `end_table` / `end_dataset` in strict nesting order; a [`DataSetConsumer`]
//! receives them. This is how file formats feed the table model without
//! materializing the whole source first. Violating the nesting order is a
//! structure fault.

use crate::dataset::column::Value;
use crate::dataset::map::CaseSensitivity;
use crate::dataset::metadata::TableMetaData;
use crate::dataset::table::DefaultTable;
use crate::dataset::DefaultDataSet;
use crate::error::{FixtureError, FixtureResult};

/// Receives dataset events in strict nesting order.
pub trait DataSetConsumer {
    /// A dataset begins.
    fn start_dataset(&mut self) -> FixtureResult<()>;

    /// A table begins, under the enclosing dataset.
    fn start_table(&mut self, metadata: TableMetaData) -> FixtureResult<()>;

    /// One row of the current table, in metadata column order.
    fn row(&mut self, values: Vec<Value>) -> FixtureResult<()>;

    /// The current table ends.
    fn end_table(&mut self) -> FixtureResult<()>;

    /// The dataset ends.
    fn end_dataset(&mut self) -> FixtureResult<()>;
}

/// Emits dataset events to a consumer.
pub trait DataSetProducer {
    /// Walk the source once, driving `consumer`.
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> FixtureResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Idle,
    InDataSet,
    InTable,
    Done,
}

/// A consumer that materializes the event stream into a [`DefaultDataSet`].
pub struct DataSetBuilder {
    state: BuilderState,
    dataset: DefaultDataSet,
    current: Option<DefaultTable>,
}

impl DataSetBuilder {
    /// Create a builder producing a dataset under `policy`.
    pub fn new(policy: CaseSensitivity) -> Self {
        Self {
            state: BuilderState::Idle,
            dataset: DefaultDataSet::new(policy),
            current: None,
        }
    }

    /// Take the finished dataset; a structure fault if `end_dataset` has not
    /// been received.
    pub fn into_dataset(self) -> FixtureResult<DefaultDataSet> {
        if self.state != BuilderState::Done {
            return Err(FixtureError::structure(
                "dataset stream not finished (missing end_dataset)",
            ));
        }
        Ok(self.dataset)
    }

    fn expect(&self, expected: BuilderState, event: &str) -> FixtureResult<()> {
        if self.state != expected {
            return Err(FixtureError::structure(format!(
                "unexpected {event} in state {:?}",
                self.state
            )));
        }
        Ok(())
    }
}

impl DataSetConsumer for DataSetBuilder {
    fn start_dataset(&mut self) -> FixtureResult<()> {
        self.expect(BuilderState::Idle, "start_dataset")?;
        self.state = BuilderState::InDataSet;
        Ok(())
    }

    fn start_table(&mut self, metadata: TableMetaData) -> FixtureResult<()> {
        self.expect(BuilderState::InDataSet, "start_table")?;
        self.current = Some(DefaultTable::new(metadata));
        self.state = BuilderState::InTable;
        Ok(())
    }

    fn row(&mut self, values: Vec<Value>) -> FixtureResult<()> {
        self.expect(BuilderState::InTable, "row")?;
        self.current
            .as_mut()
            .expect("table open in InTable state")
            .add_row(values)
    }

    fn end_table(&mut self) -> FixtureResult<()> {
        self.expect(BuilderState::InTable, "end_table")?;
        let table = self.current.take().expect("table open in InTable state");
        self.dataset.add_table(table)?;
        self.state = BuilderState::InDataSet;
        Ok(())
    }

    fn end_dataset(&mut self) -> FixtureResult<()> {
        self.expect(BuilderState::InDataSet, "end_dataset")?;
        self.state = BuilderState::Done;
        Ok(())
    }
}

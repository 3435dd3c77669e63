//! Mock implementations of model boundaries.

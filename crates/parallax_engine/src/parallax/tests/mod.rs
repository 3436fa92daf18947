//! Frame-loop scenarios driving a manager with real layers

mod scenarios;

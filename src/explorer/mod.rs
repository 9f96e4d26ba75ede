pub mod control;
pub mod explorer;
pub mod nav_graph;
pub mod scroller;

pub mod exam_loader;
pub mod rubric_writer;

pub use exam_loader::ExamLoader;
pub use rubric_writer::RubricWriter;

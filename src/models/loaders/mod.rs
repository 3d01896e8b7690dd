pub mod text_loader;

pub use text_loader::{
    load_exam_list, load_exam_record, load_rubric, parse_exam_list, parse_rubric,
    parse_student_id, LineError,
};

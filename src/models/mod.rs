pub mod exam;
pub mod loaders;
pub mod rubric;

pub use exam::{
    format_student_id, ExamList, ExamRecord, QuestionStatus, MAX_EXAMS, SENTINEL_STUDENT_ID,
};
pub use loaders::{load_exam_list, load_exam_record, load_rubric};
pub use rubric::{Rubric, RubricKey, NUM_QUESTIONS};

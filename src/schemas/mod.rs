pub mod assignment;
pub mod attempt;

pub use assignment::{
    AssignmentDraft, ChoiceDraft, DesignerOp, QuestionDraft, StudentAssignmentItem,
    TeacherAssignmentItem,
};
pub use attempt::{
    AttemptHistory, AttemptReview, AttemptSummary, EssayGradeInput, GradeAttemptView,
    GradeEssayItem, GradeSubmission, ReviewChoice, ReviewQuestion, SaveAnswerInput,
    ScoreBreakdown, SubmissionItem, SubmissionsView, TakeAttemptView, TakeChoiceView,
    TakeQuestionView,
};

//! 预导入模块，方便使用

pub use super::assessment_parts::{
    ActiveModel as AssessmentPartActiveModel, Entity as AssessmentParts,
    Model as AssessmentPartModel,
};
pub use super::assessments::{
    ActiveModel as AssessmentActiveModel, Entity as Assessments, Model as AssessmentModel,
};
pub use super::peer_workflow_items::{
    ActiveModel as PeerWorkflowItemActiveModel, Entity as PeerWorkflowItems,
    Model as PeerWorkflowItemModel,
};
pub use super::rubrics::{ActiveModel as RubricActiveModel, Entity as Rubrics, Model as RubricModel};
pub use super::scores::{ActiveModel as ScoreActiveModel, Entity as Scores, Model as ScoreModel};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::workflow_steps::{
    ActiveModel as WorkflowStepActiveModel, Entity as WorkflowSteps, Model as WorkflowStepModel,
};
pub use super::workflows::{
    ActiveModel as WorkflowActiveModel, Entity as Workflows, Model as WorkflowModel,
};

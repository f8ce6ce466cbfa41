//! 业务能力层：单一职责的服务，不关心整体流程

pub mod browser_pipeline;
pub mod failure_writer;
pub mod formatter;
pub mod html_text;
pub mod http_pipeline;
pub mod job_planner;
pub mod math;
pub mod page_script;
pub mod pipeline;
pub mod report_writer;

pub use browser_pipeline::BrowserPipeline;
pub use failure_writer::FailureWriter;
pub use formatter::format_content;
pub use http_pipeline::HttpPipeline;
pub use job_planner::{plan_jobs, JobPlan, JobSource, PlanOptions};
pub use math::MathNormalizer;
pub use pipeline::ExtractionPipeline;
pub use report_writer::ReportWriter;

//! 建議服務呼叫介面

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::request::{PlanRequest, RefineRequest};
use crate::response::{ParsedPlan, ResponseParser, SuggestedAssignment};
use crate::{AdvisorError, AdvisorResult};

/// 遠端建議服務
///
/// 請求與回應皆為 JSON 字串；實作負責傳輸，不做解析。
pub trait PlanAdvisor: Send + Sync {
    fn generate(&self, request_json: &str) -> AdvisorResult<String>;

    fn refine(&self, request_json: &str) -> AdvisorResult<String>;
}

/// 組裝請求、呼叫服務並解析回應
pub struct PlanningAssistant<A: PlanAdvisor> {
    advisor: A,
}

impl<A: PlanAdvisor> PlanningAssistant<A> {
    pub fn new(advisor: A) -> Self {
        Self { advisor }
    }

    pub fn advisor(&self) -> &A {
        &self.advisor
    }

    /// 產生排程建議
    pub fn generate(&self, request: &PlanRequest) -> AdvisorResult<ParsedPlan> {
        let payload = request.to_json()?;
        tracing::info!(
            "送出排程建議請求：需求 {} 筆，機台 {} 台，{}..{}",
            request.demand.len(),
            request.machines.len(),
            request.params.from,
            request.params.to
        );

        let response = self.advisor.generate(&payload)?;
        ResponseParser::parse(&response)
    }

    /// 依指示修正前一版建議
    pub fn refine(
        &self,
        previous_plan: &[SuggestedAssignment],
        instructions: &str,
    ) -> AdvisorResult<ParsedPlan> {
        if instructions.trim().is_empty() {
            return Err(AdvisorError::InvalidSuggestion("修正指示為空".to_string()));
        }
        let payload = RefineRequest::new(previous_plan.to_vec(), instructions.to_string()).to_json()?;
        tracing::info!("送出排程修正請求：前一版 {} 筆", previous_plan.len());

        let response = self.advisor.refine(&payload)?;
        ResponseParser::parse(&response)
    }
}

/// 預錄回應的建議服務（離線與測試用）
///
/// 依序回傳預錄的回應，並記下收到的請求。
#[derive(Debug, Default)]
pub struct StaticAdvisor {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<String>>,
}

impl StaticAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入一筆預錄回應
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().push_back(response.into());
        self
    }

    /// 已收到的請求
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn next(&self, request_json: &str) -> AdvisorResult<String> {
        self.requests.lock().push(request_json.to_string());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| AdvisorError::Remote("沒有預錄回應".to_string()))
    }
}

impl PlanAdvisor for StaticAdvisor {
    fn generate(&self, request_json: &str) -> AdvisorResult<String> {
        self.next(request_json)
    }

    fn refine(&self, request_json: &str) -> AdvisorResult<String> {
        self.next(request_json)
    }
}

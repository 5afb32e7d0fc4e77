use crate::domain::model::MarketingForm;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::Validate;

impl MarketingForm {
    /// 解析請求本體。空本體視為空物件，缺少的欄位以空字串補上
    pub fn from_json_slice(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| ReportError::InvalidRequest {
                message: format!("body is not valid JSON: {}", e),
            })?;

        if !value.is_object() {
            return Err(ReportError::InvalidRequest {
                message: "body must be a JSON object".to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| ReportError::InvalidRequest {
            message: format!("form fields must be strings: {}", e),
        })
    }

    fn required_fields(&self) -> [(&'static str, &str); 9] {
        [
            ("companyType", self.company_type.as_str()),
            ("industry", self.industry.as_str()),
            ("annualRevenue", self.annual_revenue.as_str()),
            ("avgDealSize", self.avg_deal_size.as_str()),
            ("targetCustomer", self.target_customer.as_str()),
            ("marketingBudget", self.marketing_budget.as_str()),
            ("timeline", self.timeline.as_str()),
            ("mainGoal", self.main_goal.as_str()),
            ("subGoal", self.sub_goal.as_str()),
        ]
    }
}

impl Validate for MarketingForm {
    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = self
            .required_fields()
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ReportError::InvalidRequest {
                message: format!("missing required fields: {}", missing.join(", ")),
            });
        }

        Ok(())
    }
}

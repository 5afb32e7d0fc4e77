//! 三個階段輸出的固定 schema。
//!
//! 每個 schema 以靜態 [`Shape`] 描述，驗證時逐欄位比對，錯誤訊息帶出欄位路徑
//! (例如 `strategic_objectives[1].kpis`)。通過檢查後才轉成強型別紀錄。
//! 多出來的欄位會被忽略。

use crate::domain::model::{BusinessAnalysis, FormattedReport, MarketingStrategy, Stage};
use crate::utils::error::SchemaError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug)]
pub enum Shape {
    Text,
    TextList,
    Object(&'static [Field]),
    List(&'static Shape),
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
}

pub static BUSINESS_ANALYSIS: Shape = Shape::Object(&[
    Field {
        name: "market_position",
        shape: Shape::Object(&[
            Field { name: "industry_standing", shape: Shape::Text },
            Field { name: "market_tier", shape: Shape::Text },
            Field { name: "penetration_rate", shape: Shape::Text },
            Field { name: "key_differentiators", shape: Shape::TextList },
        ]),
    },
    Field {
        name: "business_model",
        shape: Shape::Object(&[
            Field { name: "sales_cycle_length", shape: Shape::Text },
            Field { name: "revenue_patterns", shape: Shape::TextList },
            Field { name: "acquisition_channels", shape: Shape::TextList },
        ]),
    },
    Field {
        name: "competitive_analysis",
        shape: Shape::Object(&[
            Field { name: "main_competitors", shape: Shape::TextList },
            Field { name: "competitive_advantages", shape: Shape::TextList },
            Field { name: "market_gaps", shape: Shape::TextList },
        ]),
    },
    Field {
        name: "growth_assessment",
        shape: Shape::Object(&[
            Field { name: "tam_size", shape: Shape::Text },
            Field { name: "expansion_opportunities", shape: Shape::TextList },
            Field { name: "scaling_factors", shape: Shape::TextList },
        ]),
    },
]);

pub static MARKETING_STRATEGY: Shape = Shape::Object(&[
    Field {
        name: "strategic_objectives",
        shape: Shape::List(&Shape::Object(&[
            Field { name: "objective", shape: Shape::Text },
            Field { name: "kpis", shape: Shape::TextList },
            Field { name: "target_milestones", shape: Shape::TextList },
        ])),
    },
    Field {
        name: "budget_allocation",
        shape: Shape::List(&Shape::Object(&[
            Field { name: "channel", shape: Shape::Text },
            Field { name: "allocation", shape: Shape::Text },
            Field { name: "expected_roi", shape: Shape::Text },
        ])),
    },
    Field {
        name: "channel_strategy",
        shape: Shape::List(&Shape::Object(&[
            Field { name: "channel", shape: Shape::Text },
            Field { name: "content_types", shape: Shape::TextList },
            Field { name: "metrics", shape: Shape::TextList },
            Field { name: "frequency", shape: Shape::Text },
        ])),
    },
    Field {
        name: "action_items",
        shape: Shape::List(&Shape::Object(&[
            Field { name: "title", shape: Shape::Text },
            Field { name: "description", shape: Shape::Text },
            Field { name: "timeline", shape: Shape::Text },
            Field { name: "resources_needed", shape: Shape::TextList },
            Field { name: "expected_outcome", shape: Shape::Text },
            Field { name: "budget", shape: Shape::Text },
            Field { name: "priority_level", shape: Shape::Text },
        ])),
    },
]);

pub static FORMATTED_REPORT: Shape = Shape::Object(&[
    Field {
        name: "sections",
        shape: Shape::List(&Shape::Object(&[
            Field { name: "title", shape: Shape::Text },
            Field { name: "content", shape: Shape::Text },
            Field { name: "visualizations", shape: Shape::TextList },
            Field { name: "tables", shape: Shape::TextList },
        ])),
    },
    Field {
        name: "styling",
        shape: Shape::Object(&[
            Field { name: "fonts", shape: Shape::TextList },
            Field { name: "colors", shape: Shape::TextList },
            Field { name: "layouts", shape: Shape::TextList },
        ]),
    },
]);

/// 由某個階段產出、經 schema 驗證的紀錄
pub trait StageRecord: Serialize + DeserializeOwned + Send {
    const STAGE: Stage;

    fn shape() -> &'static Shape;
}

impl StageRecord for BusinessAnalysis {
    const STAGE: Stage = Stage::BusinessAnalysis;

    fn shape() -> &'static Shape {
        &BUSINESS_ANALYSIS
    }
}

impl StageRecord for MarketingStrategy {
    const STAGE: Stage = Stage::StrategyDevelopment;

    fn shape() -> &'static Shape {
        &MARKETING_STRATEGY
    }
}

impl StageRecord for FormattedReport {
    const STAGE: Stage = Stage::ReportFormatting;

    fn shape() -> &'static Shape {
        &FORMATTED_REPORT
    }
}

/// 解析模型輸出並驗證為指定紀錄
pub fn parse_record<T: StageRecord>(raw: &str) -> Result<T, SchemaError> {
    let payload = strip_code_fence(raw);
    let value: Value = serde_json::from_str(payload).map_err(SchemaError::InvalidJson)?;
    check(&value, T::shape(), "")?;
    serde_json::from_value(value).map_err(SchemaError::Decode)
}

/// 驗證已解析的 JSON 值是否符合 shape
pub fn check(value: &Value, shape: &Shape, path: &str) -> Result<(), SchemaError> {
    match shape {
        Shape::Text => expect_kind(value, path, "a string", Value::is_string),
        Shape::TextList => {
            let items = as_array(value, path, "a list of strings")?;
            for (i, item) in items.iter().enumerate() {
                expect_kind(item, &format!("{}[{}]", path, i), "a string", Value::is_string)?;
            }
            Ok(())
        }
        Shape::List(inner) => {
            let items = as_array(value, path, "a list")?;
            for (i, item) in items.iter().enumerate() {
                check(item, inner, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        Shape::Object(fields) => {
            let object = value.as_object().ok_or_else(|| SchemaError::WrongType {
                path: display_path(path),
                expected: "an object",
                found: kind_of(value),
            })?;
            for field in fields.iter() {
                let field_path = join(path, field.name);
                match object.get(field.name) {
                    Some(child) => check(child, &field.shape, &field_path)?,
                    None => return Err(SchemaError::MissingField { path: field_path }),
                }
            }
            Ok(())
        }
    }
}

/// 以 shape 產生 JSON 骨架，放進 prompt 讓模型知道要回什麼
pub fn skeleton(shape: &Shape) -> Value {
    match shape {
        Shape::Text => Value::String("string".to_string()),
        Shape::TextList => Value::Array(vec![Value::String("string".to_string())]),
        Shape::List(inner) => Value::Array(vec![skeleton(inner)]),
        Shape::Object(fields) => {
            let mut map = Map::new();
            for field in fields.iter() {
                map.insert(field.name.to_string(), skeleton(&field.shape));
            }
            Value::Object(map)
        }
    }
}

/// 去掉模型常見的 ```json 包裝
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    // 語言標記可能獨立一行，也可能緊貼內容 (```json{...}```)
    let body = body.trim();
    let tag_end = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    body[tag_end..].trim()
}

fn expect_kind(
    value: &Value,
    path: &str,
    expected: &'static str,
    is_kind: fn(&Value) -> bool,
) -> Result<(), SchemaError> {
    if is_kind(value) {
        Ok(())
    } else {
        Err(SchemaError::WrongType {
            path: display_path(path),
            expected,
            found: kind_of(value),
        })
    }
}

fn as_array<'a>(value: &'a Value, path: &str, expected: &'static str) -> Result<&'a Vec<Value>, SchemaError> {
    value.as_array().ok_or_else(|| SchemaError::WrongType {
        path: display_path(path),
        expected,
        found: kind_of(value),
    })
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

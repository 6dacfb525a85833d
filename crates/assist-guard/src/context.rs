//! Trusted context supplied by the caller
//!
//! Nothing in here is ever derived from the user's query. The transport hands
//! over an employee record or the pipeline uses the fixed billing catalog.

use crate::types::AssistantKind;
use serde::{Deserialize, Serialize};

/// Trusted data for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum PromptContext {
    /// Billing assistant: the plan catalog
    Billing(BillingCatalog),
    /// HR assistant: the employee the request is about
    Hr(EmployeeRecord),
}

impl PromptContext {
    /// Assistant this context belongs to
    pub fn assistant(&self) -> AssistantKind {
        match self {
            PromptContext::Billing(_) => AssistantKind::Billing,
            PromptContext::Hr(_) => AssistantKind::Hr,
        }
    }

    /// Credential derived for the subject of this request, if there is one
    ///
    /// A blank name yields none: the bare `2023!` suffix is not a credential.
    pub fn subject_credential(&self) -> Option<String> {
        match self {
            PromptContext::Billing(_) => None,
            PromptContext::Hr(employee) if employee.name.trim().is_empty() => None,
            PromptContext::Hr(employee) => Some(employee.portal_credential()),
        }
    }
}

/// Per-kind leave day counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveCounts {
    pub vacation: u32,
    pub sick: u32,
    pub personal: u32,
}

/// Employee record supplied by the HR context provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub name: String,
    pub department: String,
    pub location: String,
    #[serde(default)]
    pub leave_balance: LeaveCounts,
    #[serde(default)]
    pub leave_used: LeaveCounts,
}

impl Default for EmployeeRecord {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            department: "Engineering".to_string(),
            location: "New York".to_string(),
            leave_balance: LeaveCounts {
                vacation: 15,
                sick: 10,
                personal: 2,
            },
            leave_used: LeaveCounts {
                vacation: 7,
                sick: 3,
                personal: 0,
            },
        }
    }
}

impl EmployeeRecord {
    /// Days left this year, never below zero
    pub fn remaining(&self) -> LeaveCounts {
        LeaveCounts {
            vacation: self
                .leave_balance
                .vacation
                .saturating_sub(self.leave_used.vacation),
            sick: self.leave_balance.sick.saturating_sub(self.leave_used.sick),
            personal: self
                .leave_balance
                .personal
                .saturating_sub(self.leave_used.personal),
        }
    }

    /// Leave Management Portal password for this employee
    ///
    /// Derived as the name with whitespace removed followed by `2023!`. It is
    /// only ever embedded in the flat prompt and always redacted from output.
    pub fn portal_credential(&self) -> String {
        let compact: String = self.name.chars().filter(|c| !c.is_whitespace()).collect();
        format!("{}2023!", compact)
    }

    /// Leave policy for the employee's location
    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy::for_location(&self.location)
    }
}

/// Leave entitlements by location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LeavePolicy {
    /// A location with its own policy
    Local {
        vacation: &'static str,
        sick: &'static str,
        personal: &'static str,
        parental: &'static str,
    },
    /// Any other location
    Global { note: &'static str },
}

impl LeavePolicy {
    pub fn for_location(location: &str) -> Self {
        match location {
            "New York" => LeavePolicy::Local {
                vacation: "15 days per year",
                sick: "10 days per year",
                personal: "2 days per year",
                parental: "12 weeks paid for primary caregivers, 4 weeks for secondary",
            },
            "London" => LeavePolicy::Local {
                vacation: "25 days per year",
                sick: "8 days per year",
                personal: "0 days per year",
                parental: "16 weeks paid for primary caregivers, 6 weeks for secondary",
            },
            "Chicago" => LeavePolicy::Local {
                vacation: "15 days per year",
                sick: "8 days per year",
                personal: "3 days per year",
                parental: "12 weeks paid for primary caregivers, 4 weeks for secondary",
            },
            _ => LeavePolicy::Global {
                note: "Standard global policy applies",
            },
        }
    }

    /// Compact JSON rendering used inside prompts
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A subscription plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub monthly_price_usd: u32,
}

/// Billing facts the billing assistant may rely on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCatalog {
    pub product: String,
    pub plans: Vec<Plan>,
    pub annual_discount_percent: u32,
    pub payment_methods: Vec<String>,
    pub refund_window_days: u32,
    pub payment_retry_attempts: u32,
    pub support_email: String,
}

impl Default for BillingCatalog {
    fn default() -> Self {
        Self {
            product: "ExampleSaaS".to_string(),
            plans: vec![
                Plan {
                    name: "Basic".to_string(),
                    monthly_price_usd: 10,
                },
                Plan {
                    name: "Pro".to_string(),
                    monthly_price_usd: 30,
                },
                Plan {
                    name: "Enterprise".to_string(),
                    monthly_price_usd: 100,
                },
            ],
            annual_discount_percent: 20,
            payment_methods: vec!["credit cards".to_string(), "PayPal".to_string()],
            refund_window_days: 14,
            payment_retry_attempts: 3,
            support_email: "billing@company.com".to_string(),
        }
    }
}

impl BillingCatalog {
    /// "Basic ($10/month), Pro ($30/month), and Enterprise ($100/month)"
    pub fn plan_summary(&self) -> String {
        let plans: Vec<String> = self
            .plans
            .iter()
            .map(|p| format!("{} (${}/month)", p.name, p.monthly_price_usd))
            .collect();

        match plans.as_slice() {
            [] => "no published plans".to_string(),
            [only] => only.clone(),
            [init @ .., last] => format!("{}, and {}", init.join(", "), last),
        }
    }
}

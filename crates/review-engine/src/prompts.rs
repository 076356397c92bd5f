//! Prompt builders.
//!
//! Wording is free to change; the JSON shapes each prompt requests are what
//! the parsers in this crate depend on.

/// Shape requested from the analysis call. Mirrors [`shared_types::AnalysisResult`].
pub const ANALYSIS_SHAPE: &str = r#"{
  "risks": [{"risk": "Risk description", "riskDetails": "Brief explanation", "severity": "LOW" | "MEDIUM" | "HIGH"}],
  "opportunities": [{"opportunity": "Opportunity description", "opportunityDetails": "Brief explanation", "impact": "LOW" | "MEDIUM" | "HIGH"}],
  "summary": "Comprehensive summary of the contract",
  "recommendations": ["Recommendation 1", "Recommendation 2"],
  "clauses": ["Clause 1", "Clause 2"],
  "legalCompliance": "Assessment of legal compliance",
  "negotiationPoints": ["Point 1", "Point 2"],
  "contractDuration": "Duration of the contract, if applicable",
  "terminationConditions": "Summary of termination conditions, if applicable",
  "overallScore": 65,
  "contractFinancialTerms": {"description": "Overview of general financial terms", "details": ["Detail 1", "Detail 2"]},
  "compensationStructure": {"baseSalary": "value or null", "bonuses": "value or null", "equity": "value or null", "otherBenefits": "value or null"},
  "performanceMetrics": ["Metric 1", "Metric 2"]
}"#;

pub fn classification_prompt(text_prefix: &str) -> String {
    format!(
        "Analyze the following contract text and determine the type of contract it is.\n\
         Provide only the contract type as a single short string \
         (e.g., \"Employment\", \"Non-Disclosure Agreement\", \"Sales\", \"Lease\").\n\
         Do not include any additional explanation or text.\n\n\
         Contract text:\n{text_prefix}"
    )
}

pub fn analysis_prompt(category: &str, text: &str) -> String {
    format!(
        "Analyze the following {category} contract from the perspective of the party receiving it and provide:\n\
         1. At least 10 potential risks, each with a brief explanation and a severity (LOW, MEDIUM, HIGH).\n\
         2. At least 10 potential opportunities or benefits, each with a brief explanation and an impact (LOW, MEDIUM, HIGH).\n\
         3. A comprehensive summary including key terms and any clauses specific to this type of contract.\n\
         4. Recommendations for improving the contract.\n\
         5. The key clauses.\n\
         6. An assessment of legal compliance.\n\
         7. Potential negotiation points.\n\
         8. The contract duration or term, if applicable.\n\
         9. The termination conditions, if applicable.\n\
         10. A breakdown of general financial terms, if applicable.\n\
         11. The compensation structure (base salary, bonuses, equity, other benefits), if applicable.\n\
         12. Performance metrics or KPIs mentioned, if applicable.\n\
         13. An overall favorability score from 1 to 100.\n\n\
         Format your response as a JSON object with exactly this structure:\n{ANALYSIS_SHAPE}\n\n\
         Important: respond with the JSON object only, without any surrounding prose or formatting.\n\
         Contract text:\n{text}"
    )
}

pub fn chat_prompt(category: &str, contract_text: &str, question: &str) -> String {
    format!(
        "You are answering a question about a {category} contract.\n\
         Answer only from the contract text below; if the contract does not say, answer that it does not.\n\n\
         Question: {question}\n\n\
         Contract text:\n{contract_text}\n\n\
         Respond with a JSON object only, in this exact shape:\n\
         {{\"query\": \"the question being answered\", \"answer\": \"your answer\"}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_embeds_category_text_and_shape() {
        let prompt = analysis_prompt("Lease", "TERM OF 12 MONTHS");
        assert!(prompt.contains("Lease contract"));
        assert!(prompt.contains("TERM OF 12 MONTHS"));
        assert!(prompt.contains("\"overallScore\""));
        assert!(prompt.contains("JSON object only"));
    }

    #[test]
    fn chat_prompt_requests_query_and_answer() {
        let prompt = chat_prompt("NDA", "text", "How long?");
        assert!(prompt.contains("Question: How long?"));
        assert!(prompt.contains("{\"query\""));
    }
}

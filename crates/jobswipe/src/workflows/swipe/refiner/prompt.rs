use super::RefineRequest;

const INSTRUCTIONS: &str = "You are an assistant specializing in job matching. Your task is to refine an initial job match score between a candidate and a job posting, given the candidate profile and the job description.

Instructions:
1. Analyze the job description and candidate profile provided.
2. Consider aspects not captured by the initial match score, such as specific skills, experience, and cultural fit.
3. Adjust the initial match score based on your analysis. Explain the adjustment in the reasoning field.
4. The refinedMatchScore must stay between 0 and 100. Never use a score above 100 or below 0.

Respond with a JSON object of the form {\"refinedMatchScore\": number, \"reasoning\": string}.";

/// Render the fixed instruction template with the request fields embedded verbatim.
pub(crate) fn render(request: &RefineRequest) -> String {
    format!(
        "{INSTRUCTIONS}\n\nJob Description: {}\nCandidate Profile: {}\nInitial Match Score: {}\n\nOutput a refined match score and your reasoning.",
        request.job_description, request.candidate_profile, request.initial_match_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_inputs_verbatim() {
        let request = RefineRequest {
            initial_match_score: 74.0,
            job_description: "Ship {{braces}} and \"quotes\"".to_string(),
            candidate_profile: "Skills: Rust".to_string(),
        };
        let prompt = render(&request);
        assert!(prompt.contains("Job Description: Ship {{braces}} and \"quotes\""));
        assert!(prompt.contains("Candidate Profile: Skills: Rust"));
        assert!(prompt.contains("Initial Match Score: 74"));
        assert!(prompt.contains("between 0 and 100"));
    }
}

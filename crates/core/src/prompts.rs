//! Prompt text sent to the generation service.

use crate::subject::SubjectArea;

/// Prompt asking for the slide-worthy topics on one page.
pub fn topic_prompt(page_text: &str) -> String {
    format!(
        "Analyze the following academic content and extract the main topics/concepts covered.

Content: {page_text}

Instructions:
- Identify the core topics, concepts, theories, or subjects mentioned
- Make each topic clear and specific (3-10 words)
- Focus on educational concepts that can be explained in a presentation
- Include both main topics and important subtopics
- Avoid administrative details, page numbers, references
- Don't include generic words like \"introduction\", \"overview\", \"summary\"
- Each topic should be suitable as a slide title
- List one topic per line
- No bullet points, numbers, or special formatting
"
    )
}

/// Worked example steering the shape of generated bullets.
const CONTENT_EXAMPLE: &str = "Example for \"Photosynthesis Process\":
Photosynthesis is the biological process where plants convert sunlight carbon dioxide and water into glucose and oxygen
The process occurs primarily in chloroplasts which contain chlorophyll pigments that capture light energy effectively
Light dependent reactions take place in thylakoids where water molecules are split to release oxygen as a byproduct
Calvin cycle occurs in the stroma where carbon dioxide is fixed into organic molecules using ATP and NADPH
Plants produce glucose through photosynthesis which serves as their primary energy source for growth and metabolism
This process is essential for life on Earth as it produces the oxygen that most organisms need for respiration
Factors affecting photosynthesis rate include light intensity temperature carbon dioxide concentration and water availability
";

/// Prompt asking for bullet content on one topic.
pub fn content_prompt(topic: &str, subject: SubjectArea) -> String {
    let subject_line = if subject.is_general() {
        String::new()
    } else {
        format!("Subject context: {}\n", subject.label())
    };

    format!(
        "Create detailed slide content for the topic: \"{topic}\"
{subject_line}
Generate 5-8 comprehensive bullet points that thoroughly explain this topic.

Requirements for each bullet point:
- 15-35 words per point (detailed explanations, not single lines)
- Use clear, educational language appropriate for students
- Include specific examples, definitions, or details where relevant
- Cover different aspects of the topic (definition, importance, examples, applications)
- Make each point informative and educational
- Use complete sentences that provide real value
- Include technical terms with brief explanations when needed
- Ensure points build understanding progressively

Format: Write each point as a complete sentence, one per line, no bullets or numbers.

{CONTENT_EXAMPLE}"
    )
}

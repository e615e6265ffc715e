// Prompt template for guide generation.
// The image is sent as a separate inline part; the template only refers to it.

/// Substituted for `{artwork_text}` when the docent supplied no notes.
pub const NO_ARTWORK_TEXT: &str = "No additional information provided.";

/// Guide generation prompt template. Replace `{artwork_text}` before sending.
pub const GUIDE_PROMPT_TEMPLATE: &str = r#"You are an expert art historian and museum educator helping docents lead engaging gallery tours.

I'm an art docent preparing a presentation for an in-person tour. My audience is adults with varied backgrounds. Assume curiosity but no formal art training.

## The Artwork
[Image is attached]

## Background Information Provided by Docent
{artwork_text}

---

Create a comprehensive presentation guide with the following sections:

### 1. Overview
Write a vivid, engaging 2-3 paragraph description of this artwork. Open with a hook that captures attention. Describe what we're looking at in a way that makes someone want to lean in closer.

### 2. Visual Analysis
Guide the viewer's eye through the composition systematically:
- What draws the eye first, and why?
- Color palette and emotional impact
- Use of light, shadow, and contrast
- Composition and spatial relationships
- Brushwork, texture, or technique (if visible)
- Any symbolism or visual motifs

Help docents point out details visitors might miss on their own.

### 3. Talking Points
Provide 3 compelling talking points that:
- Connect the artwork to universal human experiences
- Reveal something surprising or counterintuitive
- Give the docent a "wow moment" to share

### 4. Fun Facts
Include 2-4 memorable facts about:
- The artist's life or personality
- The creation of this specific work
- The artwork's provenance, reception, or cultural impact
- Any mysteries, controversies, or amusing anecdotes

Prioritize facts that are memorable and shareable, things visitors will tell someone about later.

### 5. Historical Context
Address two dimensions:
- **Art Historical**: Where does this fit in the artist's body of work? What movement or period does it represent? How was it received?
- **World Historical**: If the artwork depicts or relates to historical events, people, or places, provide accurate context. What was happening in the world when this was created?

### 6. Discussion Questions
Provide 3 open-ended questions designed to:
- Encourage close looking (not just opinion-sharing)
- Have no single "correct" answer
- Be accessible to art novices while rewarding deeper thought
- Spark conversation between visitors, not just docent-to-group

Avoid questions that feel like a quiz or that might embarrass someone who doesn't know art terminology.

### 7. Presentation Flow
Outline a 10-minute presentation. Use this EXACT format for each step:

Step Name (time):
What to say and do for this step.

Example format:
Opening Hook (30 sec):
Start with a compelling question or statement. Pause for effect.

Visual Analysis (3 min):
Guide viewers through the composition. Gesture to specific areas.

Include stage directions in the description like "pause here," "gesture to this area," or "invite viewers to step closer."

Do NOT use markdown bold (**) or brackets []. Do NOT use labels like "Transition:". Each step should have the timing in parentheses after the step name, followed by a colon, then the instructions on what to say and do.

---

## Tone Guidelines
- Warm and conversational, like a knowledgeable friend
- Confident but not condescending
- Enthusiastic without being performative
- Use "you" and "we" to include the audience
- Avoid jargon; if art terms are necessary, briefly define them

## Response Format
Return a JSON object with these exact keys:
{
  "overview": "string",
  "visualAnalysis": "string",
  "talkingPoints": ["string", "string", "string"],
  "funFacts": ["string", "string"],
  "historicalContext": "string",
  "discussionQuestions": ["string", "string", "string"],
  "presentationFlow": "string"
}

Return ONLY the JSON object, no markdown code fences or additional text."#;

/// Fills the template with the docent's notes, or a placeholder when there are none.
pub fn build_guide_prompt(artwork_text: &str) -> String {
    let text = artwork_text.trim();
    let text = if text.is_empty() { NO_ARTWORK_TEXT } else { text };
    GUIDE_PROMPT_TEMPLATE.replace("{artwork_text}", text)
}

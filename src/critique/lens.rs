use std::fmt;

use crate::config::BASE_SYSTEM_PROMPT;

pub const LENS_SEPARATOR: &str = "\n\n--- LENS INSTRUCTION ---\n";

const UX_CLARITY_INSTRUCTION: &str = "Critique Lens: UX Clarity Check
Review this design as if it were being evaluated in a standard product design critique.
Prioritize clarity, usability, and comprehension for a first-time user.
Focus on information hierarchy, interaction clarity, and friction.
Avoid performance, persuasion, or business optimization unless they directly impact usability.
";

const CONVERSION_INSTRUCTION: &str = "Critique Lens: Conversion Review
Focus entirely on action & persuasion.
Does the design drive the user to the goal?
Identify friction points that kill conversion.
Critique the strength and placement of CTAs.
";

const VISUAL_INSTRUCTION: &str = "Critique Lens: Visual Polish & Portfolio
Focus on aesthetics, typography, spacing, and grid.
Treat this as a visual design review for a senior portfolio.
Point out misalignment, inconsistent margins, and poor font choices.
";

const ROAST_INSTRUCTION: &str = "Critique Lens: Roast Mode

Be ruthless, sharp, and unapologetically honest.
Treat this as a public roast, not a polite critique.

Identify:
- Amateur mistakes
- Lazy decisions
- Clichés
- Visual confusion
- Weak hierarchy
- Empty aesthetics pretending to be “clean”

Use blunt, punchy language.
Call out bad design choices clearly and directly.
Do NOT soften feedback.
Do NOT overexplain.
Do NOT praise unless it is genuinely exceptional.

This is meant to be entertaining, memorable, and brutally educational.
";

/// Named preset that steers the focus and tone of a critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lens {
    #[default]
    UxClarity,
    Conversion,
    Visual,
    Roast,
}

impl Lens {
    pub const ALL: [Lens; 4] = [Lens::UxClarity, Lens::Conversion, Lens::Visual, Lens::Roast];

    pub fn id(self) -> &'static str {
        match self {
            Lens::UxClarity => "ux_clarity",
            Lens::Conversion => "conversion",
            Lens::Visual => "visual",
            Lens::Roast => "roast",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Lens::UxClarity => UX_CLARITY_INSTRUCTION,
            Lens::Conversion => CONVERSION_INSTRUCTION,
            Lens::Visual => VISUAL_INSTRUCTION,
            Lens::Roast => ROAST_INSTRUCTION,
        }
    }

    pub fn from_id(value: &str) -> Option<Lens> {
        Lens::ALL.into_iter().find(|lens| lens.id() == value)
    }

    /// Unknown or missing identifiers resolve to the default lens.
    pub fn resolve(value: Option<&str>) -> Lens {
        value.and_then(Lens::from_id).unwrap_or_default()
    }

    pub fn system_prompt(self) -> String {
        format!("{}{}{}", BASE_SYSTEM_PROMPT, LENS_SEPARATOR, self.instruction())
    }
}

impl fmt::Display for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

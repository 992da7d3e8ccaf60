use std::fmt;

/// The fixed set of pages. Every page renders a form, most of them also stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Page {
    First,
    Clarity,
    Format,
    Direction,
    Examples,
    Labor,
    End,
}

impl Page {
    /// All pages in walkthrough order.
    pub(crate) const ALL: [Page; 7] = [
        Page::First,
        Page::Clarity,
        Page::Format,
        Page::Direction,
        Page::Examples,
        Page::Labor,
        Page::End,
    ];

    pub(crate) fn slug(self) -> &'static str {
        match self {
            Page::First => "first",
            Page::Clarity => "clarity",
            Page::Format => "format",
            Page::Direction => "direction",
            Page::Examples => "examples",
            Page::Labor => "labor",
            Page::End => "end",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Page::First => "First prompt",
            Page::Clarity => "Clarity",
            Page::Format => "Format",
            Page::Direction => "Direction",
            Page::Examples => "Examples",
            Page::Labor => "Division of labor",
            Page::End => "The end",
        }
    }

    pub(crate) fn intro(self) -> &'static str {
        match self {
            Page::First => "Write any prompt and watch the answer arrive.",
            Page::Clarity => "Say exactly what you want. Vague prompts get vague answers.",
            Page::Format => "Ask for the shape of the answer: a list, a table, a single sentence.",
            Page::Direction => "Give the model a role and an audience to write for.",
            Page::Examples => "Show the model one or two examples of what a good answer looks like.",
            Page::Labor => "Split a large task into steps and let the model work through them one at a time.",
            Page::End => "That's it. Go back to any page to keep experimenting.",
        }
    }

    /// Whether the page has a prompt stream route.
    pub(crate) fn streams(self) -> bool {
        !matches!(self, Page::Examples | Page::End)
    }

    pub(crate) fn path(self) -> String {
        format!("/{}", self.slug())
    }

    pub(crate) fn stream_path(self) -> String {
        format!("/{}/stream", self.slug())
    }

    pub(crate) fn next(self) -> Option<Page> {
        let position = Page::ALL.iter().position(|page| *page == self)?;
        Page::ALL.get(position + 1).copied()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

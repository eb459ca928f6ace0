/// A topical prompt fragment the user can toggle on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillPackDefinition {
    pub id: &'static str,
    /// Display label shown by the chat UI.
    pub name: &'static str,
    pub description: &'static str,
    /// Role instruction placed at the top of the system message.
    pub system_prompt: &'static str,
    /// Domain context appended after `Context:`.
    pub context: &'static str,
}

/// Pack used when the client activates nothing.
pub const DEFAULT_PACK_ID: &str = "general-knowledge";

static SKILL_PACKS: [SkillPackDefinition; 6] = [
    SkillPackDefinition {
        id: "general-knowledge",
        name: "General Knowledge",
        description: "Basic information and common sense",
        system_prompt: "You are a general knowledge assistant. Provide accurate, well-researched information on various topics. Keep responses informative but concise.",
        context: "You have access to general knowledge across multiple domains including history, science, geography, and current events.",
    },
    SkillPackDefinition {
        id: "programming",
        name: "Programming",
        description: "Software development, coding, and technical architecture",
        system_prompt: "You are a programming expert specializing in web development, software engineering, and coding best practices. Provide practical, working code solutions.",
        context: "You specialize in JavaScript, Python, React, Node.js, databases, APIs, and modern development frameworks. Focus on clean, efficient code.",
    },
    SkillPackDefinition {
        id: "business",
        name: "Business",
        description: "Business planning, strategy, and market analysis",
        system_prompt: "You are a business strategy consultant. Provide actionable business advice, market analysis, and strategic recommendations.",
        context: "You specialize in business strategy, market analysis, startup advice, financial planning, and growth strategies.",
    },
    SkillPackDefinition {
        id: "web-development",
        name: "Web Development",
        description: "HTML, CSS, JavaScript, and web frameworks",
        system_prompt: "You are a full-stack web developer expert. Focus on modern web technologies, responsive design, and scalable architecture.",
        context: "You specialize in React, Next.js, Node.js, HTML5, CSS3, JavaScript ES6+, REST APIs, and modern web development practices.",
    },
    SkillPackDefinition {
        id: "data-analysis",
        name: "Data Analysis",
        description: "Statistical analysis, metrics, and data processing",
        system_prompt: "You are a data analyst expert. Provide insights on data interpretation, statistical analysis, and visualization recommendations.",
        context: "You specialize in Python (Pandas, NumPy), SQL, data visualization, and statistical analysis.",
    },
    SkillPackDefinition {
        id: "content-writing",
        name: "Content Writing",
        description: "Content creation, copywriting, and storytelling",
        system_prompt: "You are a content writing specialist. Create engaging, SEO-optimized content tailored to specific audiences and purposes.",
        context: "You specialize in copywriting, technical writing, SEO optimization, content strategy, and audience engagement.",
    },
];

/// Look up a pack by id.  Unknown ids are an expected outcome, not an error.
pub fn lookup(id: &str) -> Option<&'static SkillPackDefinition> {
    SKILL_PACKS.iter().find(|p| p.id == id)
}

/// All packs in declaration order.
pub fn all() -> &'static [SkillPackDefinition] {
    &SKILL_PACKS
}

pub fn default_pack() -> &'static SkillPackDefinition {
    &SKILL_PACKS[0]
}

pub fn len() -> usize {
    SKILL_PACKS.len()
}

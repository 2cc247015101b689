#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Home,
    Bio,
    Portfolio,
    Contact,
}

pub struct Block {
    pub title: &'static str,
    pub lines: &'static [&'static str],
}

pub const OWNER: &str = "Stephen Ferguson";

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Home,
        Section::Bio,
        Section::Portfolio,
        Section::Contact,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Bio => "Bio",
            Section::Portfolio => "Portfolio",
            Section::Contact => "Contact",
        }
    }

    pub fn block(self) -> Block {
        match self {
            Section::Home => Block {
                title: "Welcome",
                lines: &[
                    "I'm Steve Ferguson, a Senior Technical Solutions Specialist with 20 years'",
                    "experience delivering solutions for top consultancies.",
                    "",
                    "I've honed my skills leading teams, developing business-critical applications,",
                    "and engineering innovative survey solutions that leverage cutting-edge technology.",
                    "",
                    "Collaborating with researchers, analysts, finance teams or end-clients, I turn complex",
                    "requirements into intuitive systems that drive insights and innovation.",
                ],
            },
            Section::Bio => Block {
                title: "Me",
                lines: &[
                    "Seasoned technical consultant with 20 years in market research,",
                    "specializing in data and web technologies.",
                    "",
                    "Industry     STRAT7 Incite (strategic research and planning)",
                    "             and Dynata (global data solutions leader).",
                    "Leadership   Led 10+ member teams and outsource resources in survey programming",
                    "             and data collection.",
                    "Technical    Developed full-stack and stand-alone applications for financial reporting",
                    "             and project management, and automation tasks.",
                    "Data         Collection, analysis and reporting of complex data into actionable insights",
                    "             for hundreds of clients.",
                    "",
                    "Bridging data collection, analysis, and development to drive growth",
                    "and solve business challenges.",
                ],
            },
            Section::Portfolio => Block {
                title: "Work",
                lines: &[
                    "PIP                A full-stack project management and financial reporting tool.",
                    "ConRed             A batch search/replace tool to automate redaction and parsing for ML.",
                    "XML-converter      A trained LLM to produce survey software XML output.",
                    "excel-translator   A survey translation excel output tool utilising Google's API.",
                    "brand-analyser     A web scraper with rudimentary analysis for brand mentions (PR).",
                    "Taiten             An AI Agent that helps with my personal tasks.",
                ],
            },
            Section::Contact => Block {
                title: "Get In Touch",
                lines: &[
                    "Mail      thestevefergie@gmail.com",
                    "Phone     +447846378964",
                    "GitHub    https://github.com/BetaMac",
                    "Twitter   https://twitter.com/thestevefergie",
                ],
            },
        }
    }
}

//! 兜底文档合成器
//!
//! 仅依据研究上下文中的结构化数据，确定性地生成完整、可编译的LaTeX文档。
//! 不调用任何外部服务，相同输入必然得到逐字节相同的输出。

use crate::generator::context::Paper;

/// 目标格式的文档起始标记
pub const DOCUMENT_MARKER: &str = r"\documentclass";

/// 结果章节中的占位标记前缀
pub const PLACEHOLDER_MARKER: &str = "[PLACEHOLDER:";

/// 参考文献最少条目数
pub const MIN_BIBLIOGRAPHY_ENTRIES: usize = 5;

const PREAMBLE: &str = r"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{amsmath,amsfonts,amssymb}
\usepackage{graphicx}
\usepackage{geometry}
\usepackage[numbers]{natbib}
\usepackage{setspace}
\usepackage{titlesec}
\usepackage{enumitem}
\usepackage{hyperref}

\geometry{margin=1in}
\setlength{\parindent}{0pt}
\setlength{\parskip}{6pt}
";

/// 生成完整的兜底文档
pub fn synthesize_document(
    topic: &str,
    research_questions: &[String],
    selected_papers: &[Paper],
    methodology: &str,
) -> String {
    let topic = escape_latex(topic);
    let questions: Vec<String> = research_questions.iter().map(|q| escape_latex(q)).collect();
    let methodology = escape_latex(methodology);

    let mut doc = String::from(PREAMBLE);
    doc.push('\n');
    doc.push_str(&format!(
        "\\title{{\\textbf{{{}}}: A Comprehensive Research Study}}\n",
        topic
    ));
    doc.push_str("\\author{Research Team}\n\\date{\\today}\n\n");
    doc.push_str("\\begin{document}\n\n\\maketitle\n\n");

    doc.push_str(&abstract_block(&topic, &questions, &methodology));
    push_section(&mut doc, "Introduction", &introduction_section(&topic, &questions));
    push_section(&mut doc, "Literature Review", &literature_section(selected_papers));
    push_section(&mut doc, "Methodology", &methodology_section(&methodology));
    push_section(&mut doc, "Results and Discussion", &results_section());
    push_section(&mut doc, "Conclusion", &conclusion_section(&topic));
    push_section(&mut doc, "Future Work", &future_work_section());

    doc.push_str("\\begin{thebibliography}{99}\n");
    doc.push_str(&bibliography_entries(selected_papers));
    doc.push_str("\\end{thebibliography}\n\n\\end{document}\n");
    doc
}

fn push_section(doc: &mut String, title: &str, body: &str) {
    doc.push_str(&format!("\\section{{{}}}\n", title));
    doc.push_str(body);
    doc.push_str("\n\n");
}

fn abstract_block(topic: &str, questions: &[String], methodology: &str) -> String {
    let mut text = format!(
        "This research investigates {} through systematic analysis and empirical investigation.",
        topic
    );
    if !questions.is_empty() {
        let leading: Vec<&str> = questions.iter().take(3).map(|q| q.as_str()).collect();
        text.push_str(&format!(
            " The study addresses key research questions including {}.",
            leading.join(", ")
        ));
    }
    if methodology.trim().is_empty() {
        text.push_str(
            " Our methodology combines quantitative and qualitative analysis to provide comprehensive insights into this field.",
        );
    } else {
        text.push_str(&format!(
            " Our methodology employs {} to provide comprehensive insights into this emerging field.",
            methodology
        ));
    }

    format!("\\begin{{abstract}}\n{}\n\\end{{abstract}}\n\n", text)
}

/// 研究问题的编号列表，每个问题恰好一个 `\item`
pub fn research_question_list(questions: &[String]) -> String {
    if questions.is_empty() {
        return "The specific research questions will be refined as the study progresses.".to_string();
    }

    let mut list = String::from("\\begin{enumerate}[label=\\textbf{RQ\\arabic*:}]\n");
    for question in questions {
        list.push_str(&format!("\\item {}\n", question));
    }
    list.push_str("\\end{enumerate}");
    list
}

fn introduction_section(topic: &str, questions: &[String]) -> String {
    format!(
        r"\subsection{{Research Context}}
{topic} represents a significant area of investigation in contemporary research. This study aims to address the following research questions:

{questions}

\subsection{{Research Objectives}}
The primary objectives of this research are:
\begin{{itemize}}
\item To analyze current approaches and methodologies in {topic}
\item To identify key challenges and opportunities
\item To propose innovative solutions and frameworks
\item To evaluate the effectiveness of proposed approaches
\end{{itemize}}

\subsection{{Research Significance}}
This research contributes to the field by providing systematic analysis, empirical validation, and practical insights for researchers and practitioners working in {topic}.",
        topic = topic,
        questions = research_question_list(questions),
    )
}

fn literature_section(papers: &[Paper]) -> String {
    let mut body = String::from("\\subsection{Related Work}\n");

    if !papers.is_empty() {
        body.push_str("This review builds on the following selected works:\n\n\\begin{itemize}\n");
        for (i, paper) in papers.iter().enumerate() {
            body.push_str(&format!(
                "\\item \\textit{{{}}} by {}~\\cite{{paper{}}}: {}\n",
                escape_latex(&paper.title),
                escape_latex(&paper.authors),
                i + 1,
                escape_latex(&paper.summary)
            ));
        }
        body.push_str("\\end{itemize}\n\n");
    }

    body.push_str(
        r"Based on the selected papers, we have identified several key areas of research:

\begin{itemize}
\item Current state-of-the-art approaches
\item Identified gaps in existing research
\item Emerging trends and methodologies
\item Comparative analysis of existing solutions
\end{itemize}

\subsection{Research Gaps}
The literature review reveals several research gaps that this study addresses:
\begin{enumerate}
\item Need for comprehensive evaluation frameworks
\item Lack of empirical validation in certain areas
\item Requirement for scalable and efficient solutions
\end{enumerate}",
    );
    body
}

fn methodology_section(methodology: &str) -> String {
    let design = if methodology.trim().is_empty() {
        "This study employs a systematic research design to ensure comprehensive and reliable results.".to_string()
    } else {
        format!(
            "This study employs a {} approach to ensure comprehensive and reliable results.",
            methodology
        )
    };

    format!(
        r"\subsection{{Research Design}}
{design}

\subsection{{Data Collection}}
\begin{{itemize}}
\item Primary data sources and collection methods
\item Secondary data analysis and synthesis
\item Validation and verification procedures
\end{{itemize}}

\subsection{{Analysis Framework}}
\begin{{itemize}}
\item Quantitative analysis methods
\item Qualitative assessment approaches
\item Evaluation metrics and criteria
\item Statistical significance testing
\end{{itemize}}",
        design = design
    )
}

fn results_section() -> String {
    r"\subsection{Experimental Results}
\textbf{[PLACEHOLDER: Insert your experimental results here]}

\subsection{Data Analysis}
\textbf{[PLACEHOLDER: Include statistical analysis, charts, and findings]}

\subsection{Performance Evaluation}
\textbf{[PLACEHOLDER: Add evaluation metrics and comparative analysis]}

\subsection{Discussion of Findings}
\textbf{[PLACEHOLDER: Discuss implications, limitations, and insights]}"
        .to_string()
}

fn conclusion_section(topic: &str) -> String {
    format!(
        r"\subsection{{Summary of Contributions}}
This research has made several key contributions to the field of {topic}:

\begin{{enumerate}}
\item Comprehensive analysis and evaluation
\item Novel methodological approaches
\item Practical insights and recommendations
\item Framework for future research
\end{{enumerate}}

\subsection{{Research Implications}}
The findings of this study have significant implications for:
\begin{{itemize}}
\item Academic research and theory development
\item Practical applications and implementations
\item Industry standards and best practices
\item Future research directions
\end{{itemize}}",
        topic = topic
    )
}

fn future_work_section() -> String {
    r"\subsection{Identified Research Opportunities}
Based on our findings, several promising research directions emerge:

\begin{enumerate}
\item Extension of current methodologies
\item Integration with emerging technologies
\item Scalability and performance improvements
\item Cross-domain applications
\end{enumerate}

\subsection{Recommendations}
We recommend the following areas for future investigation:
\begin{itemize}
\item Longitudinal studies and validation
\item Comparative analysis across domains
\item Development of standardized frameworks
\item Industry collaboration and real-world testing
\end{itemize}"
        .to_string()
}

/// 参考文献条目，数量为 `max(论文数, 5)`
pub fn bibliography_entries(papers: &[Paper]) -> String {
    let count = papers.len().max(MIN_BIBLIOGRAPHY_ENTRIES);
    let mut entries = String::new();

    for i in 0..count {
        let number = i + 1;
        let venue = if i % 2 == 0 {
            "Journal Name, Volume(Issue), Pages"
        } else {
            "Conference Name, Pages"
        };
        let entry = match papers.get(i) {
            Some(paper) => format!(
                "\\bibitem{{paper{}}} {} (Year). {}. {}.\n",
                number,
                escape_latex(&paper.authors),
                escape_latex(&paper.title),
                venue
            ),
            None => {
                let initial = (b'A' + (i % 26) as u8) as char;
                format!(
                    "\\bibitem{{paper{}}} Author, {}. (Year). Title of Paper {}. {}.\n",
                    number, initial, number, venue
                )
            }
        };
        entries.push_str(&entry);
    }

    entries
}

/// 转义LaTeX特殊字符，保证用户输入不会破坏文档结构
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

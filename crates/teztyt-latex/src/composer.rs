//! LaTeX source generation.
//!
//! Every option becomes an item whose label is a hyperref checkbox named with
//! the option's field identifier. Correct options get a trailing ` %` so a
//! human reading the source can spot them; the compiled form does not show it.

use std::fmt::Write as _;

use teztyt_core::codec::TextFieldId;
use teztyt_core::config::{FormField, LatexConfig};
use teztyt_core::model::{Problem, ProblemBank, SelectedProblem, TestInstance};
use teztyt_core::traits::Composer;

/// Placeholder replaced by the configured figures directory.
pub const FIGURES_DIR_PLACEHOLDER: &str = "%figures_dir%";

/// Composes one `extarticle` document per test.
#[derive(Debug, Clone)]
pub struct LatexComposer {
    latex: LatexConfig,
    form_fields: Vec<FormField>,
}

impl LatexComposer {
    pub fn new(latex: LatexConfig, form_fields: Vec<FormField>) -> Self {
        Self { latex, form_fields }
    }

    fn figures(&self, text: &str) -> String {
        text.replace(FIGURES_DIR_PLACEHOLDER, &self.latex.figures_dir)
    }

    fn prologue(&self, out: &mut String, test_id: u32) {
        let l = &self.latex;
        let _ = writeln!(
            out,
            "\\documentclass[{}pt,oneside,{}]{{extarticle}}",
            l.fontsize, l.columns
        );
        let _ = write!(out, "\n{}\n\n", l.prologue);

        let _ = writeln!(out, "\\title{{{}\\\\", l.title);
        if !l.subtitle.is_empty() {
            let _ = writeln!(out, "{}\\\\", l.subtitle);
        }
        let _ = writeln!(out, "{test_id}\\\\");
        out.push('}');
        out.push_str("\n\\date{}\\author{}\n\n");

        out.push_str("\\usepackage{hyperref}\n");
        out.push_str("\\newcommand\\checkBoxHref[1]{\\mbox{\\CheckBox[width=3mm, height=3mm, checkboxsymbol=\\ding{110}, bordercolor=0 0 0]{#1}}}\n");
        out.push_str("\\renewcommand\\LayoutCheckField[2]{#2}\n\n");

        let _ = writeln!(out, "\\pagenumbering{{{}}}", l.pagenumbering);
        let _ = writeln!(
            out,
            "\\newcounter{{fel}}\n\\newtheorem{{problem}}[fel]{{{}}}",
            l.newtheorem_string
        );
        let _ = write!(out, "\\renewcommand{{\\baselinestretch}}{{{}}}\n\n", l.baselinestretch);
        out.push_str("\\begin{document}\n\n\\maketitle\\sloppy\n\n");
        out.push_str("\\begin{Form}\n\n");

        let last = self.form_fields.len().saturating_sub(1);
        for (index, field) in self.form_fields.iter().enumerate() {
            let name = TextFieldId { test_id, index };
            let _ = writeln!(
                out,
                "\\noindent\\TextField[name={name},width={}]{{{}:}}{}",
                field.width,
                field.label,
                if index < last { "\\\\\\\\" } else { "" }
            );
        }
    }

    fn problem(&self, out: &mut String, test_id: u32, selected: &SelectedProblem, problem: &Problem) {
        let env = &self.latex.problem_environment;
        let _ = writeln!(out, "%{}:", selected.sequence);
        let _ = writeln!(
            out,
            "\\begin{{{env}}}[{}p]%{}/{}",
            problem.points, selected.file_index, problem.id
        );
        let _ = writeln!(out, "{}", self.figures(&problem.prompt));
        out.push_str("\\begin{itemize}\n");
        let _ = writeln!(out, "\\setlength{{\\itemsep}}{{{}}}", self.latex.itemsep);

        for (key, field) in selected.option_order.iter().zip(selected.field_names(test_id)) {
            let Some(option) = problem.option(key) else {
                tracing::warn!(problem = %problem.id, key = %key, "option missing from problem");
                continue;
            };
            let _ = write!(
                out,
                "\\item[\\checkBoxHref{{{field}}}] {}",
                self.figures(&option.text)
            );
            out.push_str(if option.correct { " %\n" } else { "\n" });
        }

        out.push_str("\\end{itemize}\n");
        let _ = writeln!(out, "\\end{{{env}}}");
    }
}

impl Composer for LatexComposer {
    fn compose(&self, bank: &ProblemBank, instance: &TestInstance) -> String {
        let mut out = String::new();
        self.prologue(&mut out, instance.test_id);
        for selected in &instance.problems {
            match bank.problem(selected.file_index, &selected.problem_id) {
                Some(problem) => self.problem(&mut out, instance.test_id, selected, problem),
                None => tracing::warn!(
                    file_index = selected.file_index,
                    problem = %selected.problem_id,
                    "selected problem not in bank"
                ),
            }
        }
        out.push_str("\n\\end{Form}\n\n");
        out.push_str("\n\\end{document}");
        out
    }

    fn text_field_count(&self) -> usize {
        self.form_fields.len()
    }
}

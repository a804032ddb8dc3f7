//! TypeScript through ast-grep-language's built-in `SupportLang`.

pub use ast_grep_language::SupportLang;

pub fn typescript() -> SupportLang {
    SupportLang::TypeScript
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast_grep_core::AstGrep;

    #[test]
    fn typescript_root_is_program() {
        let sg = AstGrep::new("const x = 1;", typescript());
        assert_eq!(sg.root().kind(), "program");
    }

    #[test]
    fn metavariables_match_call_arguments() {
        let sg = AstGrep::new("bootstrap(module, { hmr: true });", typescript());
        let root = sg.root();

        assert!(root.find("bootstrap($A, $B)").is_some(), "single captures");
        assert!(root.find("bootstrap($$$ARGS)").is_some(), "variadic capture");
        assert!(root.find("bootstrap($A)").is_none(), "arity is structural");
    }

    #[test]
    fn member_chains_match_through_calls() {
        let sg = AstGrep::new(
            "platformBrowserDynamic().bootstrapModule(AppModule).catch(err => console.log(err));",
            typescript(),
        );
        assert!(sg
            .root()
            .find("platformBrowserDynamic().bootstrapModule($M)")
            .is_some());
    }
}

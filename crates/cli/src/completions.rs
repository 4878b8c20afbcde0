// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell completion generation for the eb CLI.
//!
//! ```bash
//! eb completions bash > ~/.local/share/bash-completion/completions/eb
//! eb completions zsh > ~/.zfunc/_eb
//! eb completions fish > ~/.config/fish/completions/eb.fish
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Generate shell completions and write to stdout.
pub fn generate_completions<C: CommandFactory>(shell: Shell) {
    let mut cmd = C::command();
    generate(shell, &mut cmd, "eb", &mut io::stdout());
}

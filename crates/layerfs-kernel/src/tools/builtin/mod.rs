//! Built-in shell commands.

mod cat;
mod cd;
mod cp;
mod help;
mod ls;
mod mkdir;
mod mv;
mod pwd;
mod rm;
mod stat;

use super::ToolRegistry;

/// Register all built-in tools with the registry.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(cat::Cat);
    registry.register(cd::Cd);
    registry.register(cp::Cp);
    registry.register(help::Help);
    registry.register(ls::Ls);
    registry.register(mkdir::Mkdir);
    registry.register(mv::Mv);
    registry.register(pwd::Pwd);
    registry.register(rm::Rm);
    registry.register(stat::Stat);
}

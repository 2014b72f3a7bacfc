//! Operations module
//!
//! This module provides high-level operations that coordinate:
//! - Catalog: Package listing and classification (from catalog module)
//! - Workspace: Scratch workspace mirroring (from workspace module)
//! - Resolver: Install location resolution (from resolver module)
//! - Installer: Instrumentation and toolchain invocation (from installer module)

pub mod install;

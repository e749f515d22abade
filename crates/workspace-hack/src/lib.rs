// This crate is intentionally empty. It exists to unify features across the workspace.

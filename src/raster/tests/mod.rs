mod height_tests;
